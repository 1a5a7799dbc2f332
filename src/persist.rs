use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

use crate::model::{SessionId, StoreState};

/// Persistence port for the optimistic store: one state blob plus the
/// session identity token, each independently keyed. Implementations decide
/// how bytes reach storage; the store never does I/O on its own.
#[async_trait]
pub trait StatePort: Send + Sync {
    /// `Ok(None)` means first use; the store seeds fresh state.
    async fn load(&self) -> io::Result<Option<StoreState>>;
    async fn save(&self, state: &StoreState) -> io::Result<()>;
    async fn session(&self) -> io::Result<Option<SessionId>>;
    async fn set_session(&self, session: SessionId) -> io::Result<()>;
}

// ── Record codec ─────────────────────────────────────────
// Blob format: `[u32: len][bincode payload][u32: crc32]`.
// A corrupt or truncated blob is surfaced as InvalidData.

fn encode_record<T: Serialize>(value: &T) -> io::Result<Vec<u8>> {
    let payload =
        bincode::serialize(value).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let mut out = Vec::with_capacity(payload.len() + 8);
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    Ok(out)
}

fn decode_record<T: DeserializeOwned>(bytes: &[u8]) -> io::Result<T> {
    let corrupt = |what: &str| io::Error::new(io::ErrorKind::InvalidData, what.to_string());
    if bytes.len() < 8 {
        return Err(corrupt("record too short"));
    }
    let len = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    if bytes.len() != len + 8 {
        return Err(corrupt("record length mismatch"));
    }
    let payload = &bytes[4..4 + len];
    let stored_crc = u32::from_le_bytes([
        bytes[4 + len],
        bytes[5 + len],
        bytes[6 + len],
        bytes[7 + len],
    ]);
    if crc32fast::hash(payload) != stored_crc {
        return Err(corrupt("record crc mismatch"));
    }
    bincode::deserialize(payload).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

fn read_record<T: DeserializeOwned>(path: &Path) -> io::Result<Option<T>> {
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    decode_record(&bytes).map(Some)
}

/// Write to a temp file, fsync, then rename over the target so readers
/// always see either the old blob or the new one.
fn write_record<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let bytes = encode_record(value)?;
    let tmp_path = path.with_extension("bin.tmp");
    let mut file = File::create(&tmp_path)?;
    file.write_all(&bytes)?;
    file.sync_all()?;
    fs::rename(&tmp_path, path)
}

/// File-backed port: `state.bin` + `session.bin` under one data directory.
pub struct FilePort {
    state_path: PathBuf,
    session_path: PathBuf,
}

impl FilePort {
    pub fn open(data_dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(data_dir)?;
        Ok(Self {
            state_path: data_dir.join("state.bin"),
            session_path: data_dir.join("session.bin"),
        })
    }
}

#[async_trait]
impl StatePort for FilePort {
    async fn load(&self) -> io::Result<Option<StoreState>> {
        read_record(&self.state_path)
    }

    async fn save(&self, state: &StoreState) -> io::Result<()> {
        write_record(&self.state_path, state)
    }

    async fn session(&self) -> io::Result<Option<SessionId>> {
        read_record(&self.session_path)
    }

    async fn set_session(&self, session: SessionId) -> io::Result<()> {
        write_record(&self.session_path, &session)
    }
}

/// In-memory port: the test double, also usable for ephemeral embeds.
#[derive(Default)]
pub struct MemoryPort {
    state: RwLock<Option<StoreState>>,
    session: RwLock<Option<SessionId>>,
}

impl MemoryPort {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatePort for MemoryPort {
    async fn load(&self) -> io::Result<Option<StoreState>> {
        Ok(self.state.read().await.clone())
    }

    async fn save(&self, state: &StoreState) -> io::Result<()> {
        *self.state.write().await = Some(state.clone());
        Ok(())
    }

    async fn session(&self) -> io::Result<Option<SessionId>> {
        Ok(*self.session.read().await)
    }

    async fn set_session(&self, session: SessionId) -> io::Result<()> {
        *self.session.write().await = Some(session);
        Ok(())
    }
}
