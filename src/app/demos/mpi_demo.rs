use crate::config::toml_config::PrimerConfig;
use crate::core::message_passing::run_hello_world;
use crate::domain::ports::Demo;
use crate::utils::error::Result;
use crate::utils::narration::Narrator;
use async_trait::async_trait;

pub struct MessagePassingDemo {
    ranks: usize,
    root: usize,
}

impl MessagePassingDemo {
    pub fn new(ranks: usize, root: usize) -> Self {
        Self { ranks, root }
    }

    pub fn from_config(config: &PrimerConfig) -> Self {
        Self::new(config.mpi.ranks, config.mpi.root)
    }
}

#[async_trait]
impl Demo for MessagePassingDemo {
    fn name(&self) -> &str {
        "message-passing"
    }

    async fn run(&self, narrator: &mut Narrator) -> Result<()> {
        narrator.banner("MPI HELLO WORLD")?;
        narrator.lines(&[
            "Each rank is an independent worker with its own mailbox.",
            "This program shows:",
            "1. Starting a world and finding your rank and the world size",
            "2. Point-to-point communication (rank 0 sends to rank 1)",
            "3. Barrier synchronization",
            "4. Collective operations: broadcast and gather",
        ])?;
        narrator.line(format!(
            "Launching {} ranks (the equivalent of `mpirun -np {}`), root = {}",
            self.ranks, self.ranks, self.root
        ))?;

        let transcripts = run_hello_world(self.ranks, self.root).await?;

        narrator.heading("Output by rank")?;
        narrator.line("(a real MPI launcher interleaves these lines; they are grouped here)")?;
        for (rank, lines) in transcripts.iter().enumerate() {
            narrator.raw(format!("\n[rank {}]", rank))?;
            for line in lines {
                narrator.raw(line)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_demo_prints_every_rank() {
        let (mut narrator, buffer) = Narrator::capture();
        MessagePassingDemo::new(3, 0).run(&mut narrator).await.unwrap();

        let output = buffer.contents();
        assert!(output.contains("`mpirun -np 3`"));
        assert!(output.contains("[rank 0]"));
        assert!(output.contains("[rank 2]"));
        assert!(output.contains("Process 0 gathered data: [0, 10, 20]"));
        assert!(output.contains("MPI Hello World example completed successfully!"));

        let rank0 = output.find("[rank 0]").unwrap();
        let rank1 = output.find("[rank 1]").unwrap();
        assert!(rank0 < rank1);
    }

    #[tokio::test]
    async fn test_demo_reports_invalid_root() {
        let (mut narrator, _buffer) = Narrator::capture();
        let err = MessagePassingDemo::new(2, 5).run(&mut narrator).await.unwrap_err();
        assert!(matches!(
            err,
            crate::utils::error::PrimerError::InvalidRank { rank: 5, size: 2 }
        ));
    }
}
