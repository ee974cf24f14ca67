use crate::utils::error::Result;
use crate::utils::narration::Narrator;
use async_trait::async_trait;

/// A narrated lesson: runs its computation and explains it as it goes.
#[async_trait]
pub trait Demo: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, narrator: &mut Narrator) -> Result<()>;
}
