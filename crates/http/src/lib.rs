mod multipart;
mod reqwest_client;

pub use multipart::MultipartForm;
pub use reqwest_client::ReqwestHttpClient;

use std::future::Future;

pub type Error = Box<dyn std::error::Error + Send + Sync>;

pub trait HttpClient: Send + Sync {
    fn get(&self, path: &str) -> impl Future<Output = Result<Vec<u8>, Error>> + Send;

    fn post(
        &self,
        path: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> impl Future<Output = Result<Vec<u8>, Error>> + Send;
}

impl<C: HttpClient> HttpClient for std::sync::Arc<C> {
    fn get(&self, path: &str) -> impl Future<Output = Result<Vec<u8>, Error>> + Send {
        (**self).get(path)
    }

    fn post(
        &self,
        path: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> impl Future<Output = Result<Vec<u8>, Error>> + Send {
        (**self).post(path, body, content_type)
    }
}
