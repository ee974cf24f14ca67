//! MPI-style message passing between ranks of an in-process world.
//!
//! Every rank is a tokio task holding a [`Communicator`]. Ranks talk through
//! one unbounded mailbox each; payloads travel as `serde_json::Value` so any
//! serde type can be sent, much like mpi4py pickles Python objects.
//! `World::run` plays the part of `mpirun -np N`.

use crate::utils::error::{PrimerError, Result};
use crate::utils::monitor::host_name;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, Barrier};
use tokio::task::JoinSet;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    User(u32),
    Broadcast,
    Gather,
    /// Posted on a rank's behalf once its program has returned.
    Exited,
}

#[derive(Debug)]
struct Envelope {
    source: usize,
    tag: Tag,
    payload: serde_json::Value,
}

pub struct Communicator {
    rank: usize,
    size: usize,
    peers: Arc<Vec<mpsc::UnboundedSender<Envelope>>>,
    inbox: mpsc::UnboundedReceiver<Envelope>,
    /// Arrived but not yet matched by a `recv`.
    pending: VecDeque<Envelope>,
    barrier: Arc<Barrier>,
    processor_name: Arc<str>,
}

impl Communicator {
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn processor_name(&self) -> &str {
        &self.processor_name
    }

    fn check_rank(&self, rank: usize) -> Result<()> {
        if rank >= self.size {
            return Err(PrimerError::InvalidRank {
                rank,
                size: self.size,
            });
        }
        Ok(())
    }

    fn post<T: Serialize>(&self, dest: usize, tag: Tag, value: &T) -> Result<()> {
        self.check_rank(dest)?;
        let envelope = Envelope {
            source: self.rank,
            tag,
            payload: serde_json::to_value(value)?,
        };
        self.peers[dest]
            .send(envelope)
            .map_err(|_| PrimerError::Disconnected { rank: dest })?;
        trace!(from = self.rank, to = dest, ?tag, "Message posted");
        Ok(())
    }

    async fn take<T: DeserializeOwned>(&mut self, source: usize, tag: Tag) -> Result<T> {
        self.check_rank(source)?;

        let matches = |e: &Envelope| e.source == source && e.tag == tag;
        let exited = |e: &Envelope| e.source == source && e.tag == Tag::Exited;

        let buffered = self.pending.iter().position(matches);
        if let Some(envelope) = buffered.and_then(|index| self.pending.remove(index)) {
            return Ok(serde_json::from_value(envelope.payload)?);
        }
        // A rank's messages all arrive before its exit notice.
        if self.pending.iter().any(exited) {
            return Err(PrimerError::Disconnected { rank: source });
        }

        loop {
            match self.inbox.recv().await {
                Some(envelope) if matches(&envelope) => {
                    return Ok(serde_json::from_value(envelope.payload)?);
                }
                Some(envelope) => {
                    let gone = exited(&envelope);
                    trace!(rank = self.rank, from = envelope.source, tag = ?envelope.tag, "Buffering unmatched message");
                    self.pending.push_back(envelope);
                    if gone {
                        debug!(rank = self.rank, from = source, "Source rank exited before sending");
                        return Err(PrimerError::Disconnected { rank: source });
                    }
                }
                None => return Err(PrimerError::Disconnected { rank: source }),
            }
        }
    }

    /// Point-to-point send. Does not wait for the receiver.
    pub fn send<T: Serialize>(&self, dest: usize, tag: u32, value: &T) -> Result<()> {
        self.post(dest, Tag::User(tag), value)
    }

    /// Receives the next message from `source` carrying `tag`.
    ///
    /// Messages that arrive first but do not match are held back for later
    /// calls, in arrival order.
    pub async fn recv<T: DeserializeOwned>(&mut self, source: usize, tag: u32) -> Result<T> {
        self.take(source, Tag::User(tag)).await
    }

    pub async fn barrier(&self) {
        trace!(rank = self.rank, "Waiting at barrier");
        self.barrier.wait().await;
    }

    /// Every rank returns the root's value. Only the root supplies `Some`.
    pub async fn bcast<T>(&mut self, value: Option<T>, root: usize) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
    {
        self.check_rank(root)?;

        if self.rank == root {
            let value = value.ok_or(PrimerError::MissingBroadcastValue { root })?;
            for dest in (0..self.size).filter(|&r| r != root) {
                self.post(dest, Tag::Broadcast, &value)?;
            }
            Ok(value)
        } else {
            self.take(root, Tag::Broadcast).await
        }
    }

    /// The root gets every rank's value, indexed by rank. Other ranks get `None`.
    pub async fn gather<T>(&mut self, value: T, root: usize) -> Result<Option<Vec<T>>>
    where
        T: Serialize + DeserializeOwned,
    {
        self.check_rank(root)?;

        if self.rank != root {
            self.post(root, Tag::Gather, &value)?;
            return Ok(None);
        }

        let mut own = Some(value);
        let mut gathered = Vec::with_capacity(self.size);
        for source in 0..self.size {
            if source == root {
                if let Some(value) = own.take() {
                    gathered.push(value);
                }
            } else {
                gathered.push(self.take(source, Tag::Gather).await?);
            }
        }
        Ok(Some(gathered))
    }
}

/// A fixed set of ranks that all run the same program.
pub struct World {
    size: usize,
    processor_name: Arc<str>,
}

impl World {
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(PrimerError::InvalidConfigValueError {
                field: "mpi.ranks".to_string(),
                value: "0".to_string(),
                reason: "A world needs at least one rank".to_string(),
            });
        }
        Ok(Self {
            size,
            processor_name: Arc::from(host_name()),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn communicators(&self) -> Vec<Communicator> {
        let (senders, inboxes): (Vec<_>, Vec<_>) =
            (0..self.size).map(|_| mpsc::unbounded_channel()).unzip();
        let peers = Arc::new(senders);
        let barrier = Arc::new(Barrier::new(self.size));

        inboxes
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| Communicator {
                rank,
                size: self.size,
                peers: peers.clone(),
                inbox,
                pending: VecDeque::new(),
                barrier: barrier.clone(),
                processor_name: self.processor_name.clone(),
            })
            .collect()
    }

    /// Runs `program` on every rank and returns the outputs indexed by rank.
    ///
    /// The first rank to fail aborts the others, since they would otherwise
    /// wait forever on a collective that rank never joins.
    pub async fn run<F, Fut, T>(&self, program: F) -> Result<Vec<T>>
    where
        F: Fn(Communicator) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        debug!(size = self.size, "Launching ranks");
        let program = Arc::new(program);
        let mut ranks = JoinSet::new();

        for comm in self.communicators() {
            let program = program.clone();
            let rank = comm.rank();
            let peers = comm.peers.clone();
            ranks.spawn(async move {
                let result = program(comm).await;
                announce_exit(&peers, rank);
                (rank, result)
            });
        }

        let mut outputs: Vec<Option<T>> = (0..self.size).map(|_| None).collect();
        while let Some(joined) = ranks.join_next().await {
            let (rank, result) = joined?;
            match result {
                Ok(output) => outputs[rank] = Some(output),
                Err(e) => {
                    debug!(rank, error = %e, "Rank failed, aborting the world");
                    ranks.abort_all();
                    return Err(e);
                }
            }
        }

        outputs
            .into_iter()
            .enumerate()
            .map(|(rank, output)| output.ok_or(PrimerError::Disconnected { rank }))
            .collect()
    }
}

/// Tells every other rank that `rank` will send nothing more.
fn announce_exit(peers: &[mpsc::UnboundedSender<Envelope>], rank: usize) {
    for (dest, peer) in peers.iter().enumerate().filter(|(dest, _)| *dest != rank) {
        let notice = Envelope {
            source: rank,
            tag: Tag::Exited,
            payload: serde_json::Value::Null,
        };
        // Fails only when that peer has finished too.
        if peer.send(notice).is_err() {
            trace!(rank, dest, "Peer already gone");
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastPayload {
    pub data: String,
    pub number: i64,
}

/// The classic first MPI program. Returns what this rank printed.
pub async fn hello_world(mut comm: Communicator, root: usize) -> Result<Vec<String>> {
    let rank = comm.rank();
    let size = comm.size();
    let mut transcript = Vec::new();
    let mut say = |line: String| {
        debug!(rank, "{}", line);
        transcript.push(line);
    };

    say(format!(
        "Hello from process {} out of {} on processor {}",
        rank,
        size,
        comm.processor_name()
    ));

    if size < 2 {
        if rank == 0 {
            say("Only one process in the world, skipping the send from process 0 to process 1".to_string());
        }
    } else if rank == 0 {
        let message: i32 = 42;
        comm.send(1, 0, &message)?;
        say(format!("Process 0 sent message: {} to process 1", message));
    } else if rank == 1 {
        let received: i32 = comm.recv(0, 0).await?;
        say(format!("Process 1 received message: {} from process 0", received));
    }

    comm.barrier().await;

    let payload = (rank == root).then(|| BroadcastPayload {
        data: "Hello from root!".to_string(),
        number: 123,
    });
    let payload = comm.bcast(payload, root).await?;
    say(format!(
        "Process {} received broadcast: {}",
        rank,
        serde_json::to_string(&payload)?
    ));

    let local = rank * 10;
    if let Some(gathered) = comm.gather(local, root).await? {
        say(format!("Process {} gathered data: {:?}", rank, gathered));
    }

    comm.barrier().await;

    if rank == root {
        say("MPI Hello World example completed successfully!".to_string());
    }

    Ok(transcript)
}

pub async fn run_hello_world(size: usize, root: usize) -> Result<Vec<Vec<String>>> {
    World::new(size)?
        .run(move |comm| hello_world(comm, root))
        .await
}
