/// Session Registry
///
/// Authoritative record of which access token and which refresh token each
/// user may currently present. Signed tokens cannot be revoked on their own;
/// overwriting a slot here is what retires the previous token.
///
/// Tokens are stored as SHA-256 fingerprints, never as bearer strings.
/// Users are spread over independently locked shards so sessions of
/// different users never contend on the same lock.

use sha2::{Digest, Sha256};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

const SHARD_COUNT: usize = 16;

type Fingerprint = [u8; 32];

fn fingerprint(token: &str) -> Fingerprint {
    let mut print = [0u8; 32];
    print.copy_from_slice(&Sha256::digest(token.as_bytes()));
    print
}

#[derive(Debug, Default, Clone, Copy)]
struct Session {
    access: Option<Fingerprint>,
    refresh: Option<Fingerprint>,
}

type Shard = HashMap<String, Session>;

pub struct SessionRegistry {
    shards: Vec<RwLock<Shard>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::with_shards(SHARD_COUNT)
    }

    pub fn with_shards(count: usize) -> Self {
        let count = count.max(1);
        Self {
            shards: (0..count).map(|_| RwLock::new(HashMap::new())).collect(),
        }
    }

    fn shard_index(&self, user: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        user.hash(&mut hasher);
        (hasher.finish() as usize) % self.shards.len()
    }

    // Every write is a single map operation, so a poisoned shard is still consistent
    fn read(&self, user: &str) -> RwLockReadGuard<'_, Shard> {
        self.shards[self.shard_index(user)]
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self, user: &str) -> RwLockWriteGuard<'_, Shard> {
        self.shards[self.shard_index(user)]
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the honoured access token for `user`
    pub fn set_access(&self, user: &str, token: &str) {
        let print = fingerprint(token);
        self.write(user).entry(user.to_string()).or_default().access = Some(print);
    }

    /// Replace the honoured refresh token for `user`
    pub fn set_refresh(&self, user: &str, token: &str) {
        let print = fingerprint(token);
        self.write(user).entry(user.to_string()).or_default().refresh = Some(print);
    }

    /// Install a fresh session, dropping whatever `user` had before
    pub fn open(&self, user: &str, access: &str, refresh: Option<&str>) {
        let session = Session {
            access: Some(fingerprint(access)),
            refresh: refresh.map(fingerprint),
        };
        self.write(user).insert(user.to_string(), session);
    }

    /// Swap in a new token pair only if `presented` is still the honoured
    /// refresh token. Check and swap happen under one lock, so a refresh
    /// token can be redeemed at most once.
    pub fn rotate(&self, user: &str, presented: &str, access: &str, refresh: &str) -> bool {
        let presented = fingerprint(presented);
        let access = fingerprint(access);
        let refresh = fingerprint(refresh);

        let mut shard = self.write(user);
        match shard.get_mut(user) {
            Some(session) if session.refresh == Some(presented) => {
                session.access = Some(access);
                session.refresh = Some(refresh);
                true
            }
            _ => false,
        }
    }

    pub fn is_current_access(&self, user: &str, token: &str) -> bool {
        let print = fingerprint(token);
        self.read(user)
            .get(user)
            .map_or(false, |session| session.access == Some(print))
    }

    pub fn is_current_refresh(&self, user: &str, token: &str) -> bool {
        let print = fingerprint(token);
        self.read(user)
            .get(user)
            .map_or(false, |session| session.refresh == Some(print))
    }

    /// Forget both tokens for `user`; clearing an absent user is a no-op
    pub fn clear(&self, user: &str) {
        self.write(user).remove(user);
    }

    pub fn contains(&self, user: &str) -> bool {
        self.read(user).contains_key(user)
    }

    /// Number of users holding a session
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| {
                shard
                    .read()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .len()
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
