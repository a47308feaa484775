use serde::{Deserialize, Serialize};

/// List envelope shared by every paginated endpoint.
#[derive(Debug, Deserialize, Serialize)]
pub struct PageWrapper<T> {
    pub count: usize,
    pub results: Vec<T>,
}

impl<T> PageWrapper<T> {
    pub fn wrap(results: Vec<T>) -> PageWrapper<T> {
        PageWrapper {
            count: results.len(),
            results,
        }
    }
}
