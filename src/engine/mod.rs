pub mod assistant;

use async_trait::async_trait;

use crate::error::Result;
use crate::session::{RunControl, Summary};

/// The outermost boundary. The web layer and the CLI only know this trait.
#[async_trait]
pub trait Engine: Send + Sync {
    async fn summarize(&self, topic: &str, control: &RunControl) -> Result<Summary>;
}
