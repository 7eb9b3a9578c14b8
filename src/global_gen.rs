//! Process-wide generator and entry point functions.

#![cfg(feature = "global_gen")]
#![cfg_attr(docsrs, doc(cfg(feature = "global_gen")))]

use std::sync::{self, OnceLock};

use crate::config::Config;
use crate::error::Error;
use crate::node::NodeIdentity;
use crate::SnowflakeId;
use inner::GlobalGenInner;

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Returns the lock handle of process-wide global generator, creating one if none exists.
fn lock_global_gen() -> Result<sync::MutexGuard<'static, GlobalGenInner>, Error> {
    static G: OnceLock<Result<sync::Mutex<GlobalGenInner>, Error>> = OnceLock::new();
    match G.get_or_init(|| {
        GlobalGenInner::new(CONFIG.get_or_init(Config::default).clone()).map(sync::Mutex::new)
    }) {
        Ok(g) => Ok(g.lock().unwrap_or_else(sync::PoisonError::into_inner)),
        Err(err) => Err(err.clone()),
    }
}

/// Sets the configuration of the process-wide generator.
///
/// Only the first call made before any identifier is generated takes effect. Later calls, and
/// calls after the global generator has been created, hand the configuration back as `Err`.
///
/// An explicit [`Config::with_process_id`] survives a fork unchanged, so a parent and a child
/// that keep generating can issue the same identifier within one millisecond. Assign a distinct
/// process id in the child, or leave it to be derived from the OS process id, when forking.
///
/// # Examples
///
/// ```rust
/// use snowgen::Config;
///
/// snowgen::configure(Config::default().with_machine_id(12)).unwrap();
/// assert_eq!(snowgen::generate_unique_id()?.machine_id(), 12);
///
/// assert!(snowgen::configure(Config::default()).is_err());
/// # Ok::<(), snowgen::Error>(())
/// ```
pub fn configure(config: Config) -> Result<(), Config> {
    CONFIG.set(config)
}

/// Generates a snowflake identifier.
///
/// This function employs a process-wide generator behind a mutex and guarantees the
/// process-wide monotonic order of identifiers for as long as the system clock does not move
/// backwards. On Unix, this function rebuilds the generator when the process ID changes (i.e.,
/// upon process forks) so that a child re-derives its process id segment. A process id assigned
/// through [`configure`] is kept as given, which leaves parent and child open to collisions.
///
/// # Errors
///
/// Fails with [`Error::ClockRollback`] when the system clock reads earlier than the last issued
/// identifier, [`Error::TimestampOverflow`] once the 41-bit lifetime after the epoch offset is
/// used up, and [`Error::NodeIdRange`] when [`configure`] assigned an out-of-range id.
///
/// # Examples
///
/// ```rust
/// let id = snowgen::generate_unique_id()?;
/// println!("{}", id); // e.g., "1342179397985"
/// println!("{:?}", id.to_fields()); // (elapsed_ms, machine_id, process_id, sequence)
///
/// let id_string: String = snowgen::generate_unique_id()?.to_string();
/// # Ok::<(), snowgen::Error>(())
/// ```
pub fn generate_unique_id() -> Result<SnowflakeId, Error> {
    lock_global_gen()?.get_mut()?.generate()
}

/// Returns the node identity of the process-wide generator, creating the generator if needed.
pub fn global_identity() -> Result<NodeIdentity, Error> {
    Ok(lock_global_gen()?.get_mut()?.identity())
}

mod inner {
    use rand::rngs::adapter::ReseedingRng;
    use rand::rngs::OsRng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Core;

    use crate::config::Config;
    use crate::error::Error;
    use crate::generator::{Generator, RandSource};

    /// The random number generator of the global generator.
    ///
    /// The global generator currently employs [`ChaCha12Core`] with [`ReseedingRng`] wrapper to
    /// emulate the strategy used by [`rand::rngs::ThreadRng`].
    #[derive(Debug)]
    pub struct GlobalGenRng(ReseedingRng<ChaCha12Core, OsRng>);

    impl GlobalGenRng {
        fn new() -> Self {
            Self(ReseedingRng::new(
                ChaCha12Core::from_entropy(),
                1024 * 64,
                OsRng,
            ))
        }
    }

    impl RandSource for GlobalGenRng {
        fn next_u32(&mut self) -> u32 {
            rand::RngCore::next_u32(&mut self.0)
        }
    }

    /// A thin wrapper to rebuild the generator when the process ID changes (i.e., upon Unix
    /// forks).
    #[derive(Debug)]
    pub struct GlobalGenInner {
        #[cfg(unix)]
        pid: u32,
        #[cfg_attr(not(unix), allow(dead_code))]
        config: Config,
        generator: Generator<GlobalGenRng>,
    }

    impl GlobalGenInner {
        pub fn new(config: Config) -> Result<Self, Error> {
            Ok(Self {
                #[cfg(unix)]
                pid: std::process::id(),
                generator: Generator::with_config(&config, GlobalGenRng::new())?,
                config,
            })
        }

        /// Returns a mutable reference to the inner [`Generator`] instance, rebuilding the
        /// generator on Unix if the process ID has changed.
        pub fn get_mut(&mut self) -> Result<&mut Generator<GlobalGenRng>, Error> {
            #[cfg(unix)]
            if self.pid != std::process::id() {
                tracing::debug!(
                    old_pid = self.pid,
                    new_pid = std::process::id(),
                    "process id changed, rebuilding global generator"
                );
                if let Some(process_id) = self.config.process_id() {
                    tracing::warn!(
                        process_id,
                        "explicit process id kept across fork, ids may collide with the parent"
                    );
                }
                *self = Self::new(self.config.clone())?;
            }
            Ok(&mut self.generator)
        }
    }

}
