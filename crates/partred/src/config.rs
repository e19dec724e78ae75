//! Configuration shared by every reduction call.

use crate::error::Error;
use partred_nostd_internal::MAX_MEMBERS_PER_TEAM;
use std::num::NonZeroU32;
use std::sync::Arc;

/// Selects the backend that executes a reduction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// nested level -> tile -> particle loops on the host, optionally
    /// distributed over a pool of host threads
    #[default]
    Host,
    /// per-tile launches of thread-blocks that fold with a grid-stride loop,
    /// tree-reduce in block-shared scratch, and atomically combine into a
    /// single device accumulator
    Accelerator,
}

/// Controls how the members of an accelerator thread-block get executed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TeamKind {
    /// a single thread simulates every member of the block in lockstep
    #[default]
    Serial,
    /// every member of the block runs on its own thread and the members
    /// synchronize with a barrier
    Threaded,
}

/// Configures a reduction.
///
/// Construct instances with [`ReduceConfigBuilder`]. The default
/// configuration runs on the host and is allowed to use the global rayon
/// thread pool.
#[derive(Clone, Debug)]
pub struct ReduceConfig {
    execution_mode: ExecutionMode,
    deterministic: bool,
    host_pool: Option<Arc<rayon::ThreadPool>>,
    max_threads_per_block: NonZeroU32,
    max_blocks: NonZeroU32,
    particles_per_thread: NonZeroU32,
    team_kind: TeamKind,
}

impl Default for ReduceConfig {
    fn default() -> Self {
        ReduceConfig {
            execution_mode: ExecutionMode::Host,
            deterministic: false,
            host_pool: None,
            max_threads_per_block: DEFAULT_MAX_THREADS_PER_BLOCK,
            max_blocks: DEFAULT_MAX_BLOCKS,
            particles_per_thread: DEFAULT_PARTICLES_PER_THREAD,
            team_kind: TeamKind::Serial,
        }
    }
}

impl ReduceConfig {
    pub fn execution_mode(&self) -> ExecutionMode {
        self.execution_mode
    }

    /// When `true`, the host backend visits every particle in a fixed
    /// sequential order, so repeated calls produce bitwise identical results.
    pub fn deterministic(&self) -> bool {
        self.deterministic
    }

    /// the dedicated host thread pool (`None` means the global rayon pool)
    pub fn host_pool(&self) -> Option<&rayon::ThreadPool> {
        self.host_pool.as_deref()
    }

    pub fn max_threads_per_block(&self) -> NonZeroU32 {
        self.max_threads_per_block
    }

    pub fn max_blocks(&self) -> NonZeroU32 {
        self.max_blocks
    }

    pub fn particles_per_thread(&self) -> NonZeroU32 {
        self.particles_per_thread
    }

    pub fn team_kind(&self) -> TeamKind {
        self.team_kind
    }
}

const DEFAULT_MAX_THREADS_PER_BLOCK: NonZeroU32 = NonZeroU32::new(256).unwrap();
const DEFAULT_MAX_BLOCKS: NonZeroU32 = NonZeroU32::new(65535).unwrap();
const DEFAULT_PARTICLES_PER_THREAD: NonZeroU32 = NonZeroU32::new(32).unwrap();
const MAX_HOST_THREADS: usize = 4096;

/// Builds a [`ReduceConfig`].
///
/// ```
/// use partred::{ExecutionMode, ReduceConfigBuilder};
///
/// let config = ReduceConfigBuilder::new()
///     .execution_mode(ExecutionMode::Accelerator)
///     .max_threads_per_block(128)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_threads_per_block().get(), 128);
/// ```
#[derive(Clone, Debug)]
pub struct ReduceConfigBuilder {
    execution_mode: ExecutionMode,
    deterministic: bool,
    host_threads: Option<usize>,
    max_threads_per_block: u32,
    max_blocks: u32,
    particles_per_thread: u32,
    team_kind: TeamKind,
}

impl Default for ReduceConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReduceConfigBuilder {
    pub fn new() -> Self {
        ReduceConfigBuilder {
            execution_mode: ExecutionMode::Host,
            deterministic: false,
            host_threads: None,
            max_threads_per_block: DEFAULT_MAX_THREADS_PER_BLOCK.get(),
            max_blocks: DEFAULT_MAX_BLOCKS.get(),
            particles_per_thread: DEFAULT_PARTICLES_PER_THREAD.get(),
            team_kind: TeamKind::Serial,
        }
    }

    pub fn execution_mode(&mut self, mode: ExecutionMode) -> &mut Self {
        self.execution_mode = mode;
        self
    }

    /// force the host backend to visit particles sequentially, in order
    pub fn deterministic(&mut self, deterministic: bool) -> &mut Self {
        self.deterministic = deterministic;
        self
    }

    /// build a dedicated pool of `n_threads` host threads (rather than
    /// sharing the global rayon pool)
    pub fn host_threads(&mut self, n_threads: usize) -> &mut Self {
        self.host_threads = Some(n_threads);
        self
    }

    pub fn max_threads_per_block(&mut self, max_threads_per_block: u32) -> &mut Self {
        self.max_threads_per_block = max_threads_per_block;
        self
    }

    pub fn max_blocks(&mut self, max_blocks: u32) -> &mut Self {
        self.max_blocks = max_blocks;
        self
    }

    pub fn particles_per_thread(&mut self, particles_per_thread: u32) -> &mut Self {
        self.particles_per_thread = particles_per_thread;
        self
    }

    pub fn team_kind(&mut self, team_kind: TeamKind) -> &mut Self {
        self.team_kind = team_kind;
        self
    }

    pub fn build(&self) -> Result<ReduceConfig, Error> {
        let max_threads_per_block = nonzero_in_range(
            "max_threads_per_block",
            self.max_threads_per_block,
            MAX_MEMBERS_PER_TEAM,
        )?;
        let max_blocks = nonzero_in_range("max_blocks", self.max_blocks, u32::MAX)?;
        let particles_per_thread =
            nonzero_in_range("particles_per_thread", self.particles_per_thread, u32::MAX)?;

        let host_pool = match self.host_threads {
            None => None,
            Some(n) if (n == 0) || (n > MAX_HOST_THREADS) => {
                return Err(Error::integer_range(
                    "host_threads",
                    n as i64,
                    1,
                    MAX_HOST_THREADS as i64,
                ));
            }
            Some(n) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .thread_name(|idx| format!("partred-{idx}"))
                    .build()
                    .map_err(Error::thread_pool)?;
                Some(Arc::new(pool))
            }
        };

        Ok(ReduceConfig {
            execution_mode: self.execution_mode,
            deterministic: self.deterministic,
            host_pool,
            max_threads_per_block,
            max_blocks,
            particles_per_thread,
            team_kind: self.team_kind,
        })
    }
}

fn nonzero_in_range(description: &'static str, val: u32, max_val: u32) -> Result<NonZeroU32, Error> {
    match NonZeroU32::new(val) {
        Some(v) if val <= max_val => Ok(v),
        _ => Err(Error::integer_range(
            description,
            val as i64,
            1,
            max_val as i64,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ReduceConfig::default();
        assert_eq!(config.execution_mode(), ExecutionMode::Host);
        assert!(!config.deterministic());
        assert!(config.host_pool().is_none());
        assert_eq!(config.max_threads_per_block().get(), 256);
        assert_eq!(config.max_blocks().get(), 65535);
        assert_eq!(config.particles_per_thread().get(), 32);
        assert_eq!(config.team_kind(), TeamKind::Serial);

        let built = ReduceConfigBuilder::new().build().unwrap();
        assert_eq!(built.max_threads_per_block(), config.max_threads_per_block());
        assert_eq!(built.max_blocks(), config.max_blocks());
    }

    #[test]
    fn invalid_values() {
        assert!(ReduceConfigBuilder::new().max_threads_per_block(0).build().is_err());
        assert!(
            ReduceConfigBuilder::new()
                .max_threads_per_block(MAX_MEMBERS_PER_TEAM + 1)
                .build()
                .is_err()
        );
        assert!(ReduceConfigBuilder::new().max_blocks(0).build().is_err());
        assert!(ReduceConfigBuilder::new().particles_per_thread(0).build().is_err());
        assert!(ReduceConfigBuilder::new().host_threads(0).build().is_err());
    }

    #[test]
    fn dedicated_pool() {
        let config = ReduceConfigBuilder::new().host_threads(3).build().unwrap();
        let pool = config.host_pool().unwrap();
        assert_eq!(pool.current_num_threads(), 3);

        // clones share the same pool
        let other = config.clone();
        assert!(std::ptr::eq(pool, other.host_pool().unwrap()));
    }
}
