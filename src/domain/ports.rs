use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// File names directly under `dir` ("" for the root), sorted.
    fn list_files(&self, dir: &str)
        -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
    /// Missing files are not an error.
    fn remove_file(&self, path: &str) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Human-readable location of `path`, used in logs and reports.
    fn location(&self, path: &str) -> String {
        path.to_string()
    }
}

/// A generator run split into extract / transform / load.
#[async_trait]
pub trait Pipeline: Send + Sync {
    type Input: Send;
    type Output: Send + Sync;

    fn name(&self) -> &'static str;
    async fn extract(&self) -> Result<Self::Input>;
    async fn transform(&self, input: Self::Input) -> Result<Self::Output>;
    /// Persists the artefacts and returns where they were written.
    async fn load(&self, output: &Self::Output) -> Result<String>;
}
