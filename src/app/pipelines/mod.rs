pub mod class_pipeline;
pub mod exam_calendar_pipeline;
pub mod seating_pipeline;

pub use class_pipeline::ClassPipeline;
pub use exam_calendar_pipeline::ExamCalendarPipeline;
pub use seating_pipeline::{SeatingFiles, SeatingPipeline};

use crate::utils::error::{Result, TimetableError};

/// Runs CPU-bound scheduling on the blocking pool.
pub(crate) async fn run_blocking<T, F>(name: &str, job: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| TimetableError::processing(format!("{} task failed: {}", name, e)))?
}

#[cfg(test)]
pub(crate) mod mock {
    use crate::domain::ports::Storage;
    use crate::utils::error::{Result, TimetableError};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    pub struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        pub fn with_files(files: &[(&str, &str)]) -> Self {
            let map = files
                .iter()
                .map(|(name, data)| (name.to_string(), data.as_bytes().to_vec()))
                .collect();
            Self {
                files: Arc::new(Mutex::new(map)),
            }
        }

        pub async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            self.files.lock().await.get(path).cloned()
        }

        pub async fn get_text(&self, path: &str) -> Option<String> {
            self.get_file(path)
                .await
                .map(|data| String::from_utf8_lossy(&data).to_string())
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                TimetableError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }

        async fn list_files(&self, dir: &str) -> Result<Vec<String>> {
            let prefix = if dir.is_empty() {
                String::new()
            } else {
                format!("{}/", dir.trim_end_matches('/'))
            };
            let files = self.files.lock().await;
            let mut names: Vec<String> = files
                .keys()
                .filter_map(|k| k.strip_prefix(&prefix))
                .filter(|k| !k.contains('/'))
                .map(|k| k.to_string())
                .collect();
            names.sort();
            Ok(names)
        }

        async fn exists(&self, path: &str) -> bool {
            self.files.lock().await.contains_key(path)
        }

        async fn remove_file(&self, path: &str) -> Result<()> {
            self.files.lock().await.remove(path);
            Ok(())
        }

        fn location(&self, path: &str) -> String {
            format!("memory://{}", path)
        }
    }
}
