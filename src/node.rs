//! Node identity derived from the local host and process.
//!
//! Nothing here is registered with or checked against other nodes. Two hosts whose names hash to
//! the same machine id, running processes whose pids agree in their low ten bits, will produce
//! colliding identifiers. Deployments that need strict multi-host uniqueness should assign
//! machine ids explicitly through [`Config::with_machine_id`](crate::Config::with_machine_id).

use std::{env, fs, process, sync::OnceLock};

use crate::error::{Error, NodeIdKind};
use crate::id::MAX_NODE_ID;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// The `(machine_id, process_id)` pair embedded in every identifier a generator issues.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct NodeIdentity {
    machine_id: u16,
    process_id: u16,
}

impl NodeIdentity {
    /// Creates an identity from explicitly assigned ids.
    ///
    /// Fails with [`Error::NodeIdRange`] if either id exceeds [`MAX_NODE_ID`].
    pub fn new(machine_id: u16, process_id: u16) -> Result<Self, Error> {
        if machine_id > MAX_NODE_ID {
            return Err(Error::NodeIdRange {
                kind: NodeIdKind::Machine,
                value: machine_id.into(),
            });
        }
        if process_id > MAX_NODE_ID {
            return Err(Error::NodeIdRange {
                kind: NodeIdKind::Process,
                value: process_id.into(),
            });
        }
        Ok(Self {
            machine_id,
            process_id,
        })
    }

    /// Derives the identity of the calling process from the host name and the OS process id.
    ///
    /// The machine id is computed once per process and reused afterwards. The process id is read
    /// on every call so that a forked child picks up its own pid.
    pub fn detect() -> Self {
        let pid = process::id();
        let identity = Self {
            machine_id: local_machine_id(),
            process_id: process_id(pid),
        };
        debug_assert!(identity.machine_id <= MAX_NODE_ID && identity.process_id <= MAX_NODE_ID);
        tracing::debug!(
            machine_id = identity.machine_id,
            process_id = identity.process_id,
            pid,
            "derived node identity"
        );
        identity
    }

    /// Returns the machine id.
    pub const fn machine_id(&self) -> u16 {
        self.machine_id
    }

    /// Returns the process id.
    pub const fn process_id(&self) -> u16 {
        self.process_id
    }
}

/// Maps a host name onto the machine id space using a 64-bit FNV-1a hash reduced modulo 1024.
///
/// The hash is fixed by this function rather than by the standard library, so the same host
/// name yields the same machine id across processes, builds, and toolchain versions.
pub fn machine_id(hostname: &str) -> u16 {
    let hash = hostname.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    });
    (hash % (u64::from(MAX_NODE_ID) + 1)) as u16
}

/// Keeps the low ten bits of an OS process id.
pub const fn process_id(pid: u32) -> u16 {
    (pid & MAX_NODE_ID as u32) as u16
}

fn local_machine_id() -> u16 {
    static MACHINE_ID: OnceLock<u16> = OnceLock::new();
    *MACHINE_ID.get_or_init(|| {
        let (hostname, source) = local_hostname();
        let id = machine_id(&hostname);
        tracing::debug!(hostname = %hostname, source, machine_id = id, "derived machine id");
        id
    })
}

/// Looks up the network name of this host, returning it with a label naming where it came from.
fn local_hostname() -> (String, &'static str) {
    let non_empty = |s: String| {
        let s = s.trim().to_owned();
        (!s.is_empty()).then_some(s)
    };

    if let Some(name) = env::var("HOSTNAME").ok().and_then(non_empty) {
        return (name, "HOSTNAME");
    }
    if let Some(name) = fs::read_to_string("/etc/hostname").ok().and_then(non_empty) {
        return (name, "/etc/hostname");
    }
    if let Some(name) = env::var("COMPUTERNAME").ok().and_then(non_empty) {
        return (name, "COMPUTERNAME");
    }

    tracing::warn!("could not determine host name, falling back to \"localhost\"");
    ("localhost".to_owned(), "fallback")
}

#[cfg(test)]
mod tests {
    use super::{machine_id, process_id, NodeIdentity};
    use crate::{Error, NodeIdKind};

    /// Derives stable machine ids from host names
    #[test]
    fn derives_stable_machine_ids_from_host_names() {
        // FNV-1a("") is the offset basis itself
        assert_eq!(machine_id(""), (0xcbf2_9ce4_8422_2325u64 % 1024) as u16);
        for name in ["localhost", "web-01.example.com", "db-primary", "節点"] {
            let id = machine_id(name);
            assert!(id <= 1023);
            assert_eq!(id, machine_id(name));
        }
        assert_ne!(machine_id("web-01"), machine_id("web-02"));
    }

    /// Keeps the low ten bits of process ids
    #[test]
    fn keeps_the_low_ten_bits_of_process_ids() {
        assert_eq!(process_id(0), 0);
        assert_eq!(process_id(1023), 1023);
        assert_eq!(process_id(1024), 0);
        assert_eq!(process_id(4242), 4242 & 1023);
        assert_eq!(process_id(u32::MAX), 1023);
    }

    /// Detects the same identity on every call
    #[test]
    fn detects_the_same_identity_on_every_call() {
        let first = NodeIdentity::detect();
        assert_eq!(first.process_id(), process_id(std::process::id()));
        for _ in 0..100 {
            assert_eq!(NodeIdentity::detect(), first);
        }
    }

    /// Detects the same identity from concurrent threads
    #[test]
    fn detects_the_same_identity_from_concurrent_threads() {
        let expected = NodeIdentity::detect();
        std::thread::scope(|s| {
            let handles: Vec<_> = (0..8).map(|_| s.spawn(NodeIdentity::detect)).collect();
            for h in handles {
                assert_eq!(h.join().unwrap(), expected);
            }
        });
    }

    /// Rejects explicit ids wider than ten bits
    #[test]
    fn rejects_explicit_ids_wider_than_ten_bits() {
        assert!(NodeIdentity::new(1023, 1023).is_ok());
        assert_eq!(
            NodeIdentity::new(1024, 0),
            Err(Error::NodeIdRange {
                kind: NodeIdKind::Machine,
                value: 1024
            })
        );
        assert_eq!(
            NodeIdentity::new(0, u16::MAX),
            Err(Error::NodeIdRange {
                kind: NodeIdKind::Process,
                value: u16::MAX.into()
            })
        );
    }
}
