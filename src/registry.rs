//! Room registry: code allocation, lookup, disposal, idle sweeping.
//!
//! The registry map is the only structure shared by request handlers; it is
//! guarded by a plain mutex with short critical sections (map reads and
//! writes only). Room handles are used outside the lock.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::catalog::SongCatalog;
use crate::config::Config;
use crate::errors::{GameError, GameResult};
use crate::protocol::{close_codes, game_codes, validation};
use crate::room::{spawn_room, Origin, RoomCommand, RoomHandle, RoomRuntimeConfig};

pub struct RoomRegistry {
    rooms: Mutex<HashMap<String, RoomHandle>>,
    catalog: Arc<dyn SongCatalog>,
    config: Arc<Config>,
    room_config: RoomRuntimeConfig,
}

impl RoomRegistry {
    pub fn new(catalog: Arc<dyn SongCatalog>, config: Arc<Config>) -> Self {
        let room_config = RoomRuntimeConfig::from_config(&config);
        Self {
            rooms: Mutex::new(HashMap::new()),
            catalog,
            config,
            room_config,
        }
    }

    /// Create a room in WAITING state under a freshly allocated code.
    ///
    /// Codes are drawn at random and retried a bounded number of times on
    /// collision; running out of attempts (or of room budget) surfaces as
    /// `CapacityExhausted`, a 503-class condition.
    pub fn create_room(
        &self,
        max_rounds: u32,
        genres: Vec<String>,
    ) -> GameResult<(String, RoomHandle)> {
        validation::validate_max_rounds_with_config(max_rounds, &self.config.protocol)
            .map_err(GameError::ClientProtocol)?;
        validation::validate_genres_with_config(&genres, &self.config.protocol)
            .map_err(GameError::ClientProtocol)?;

        if self.room_count() >= self.config.server.max_rooms {
            tracing::warn!(
                max_rooms = self.config.server.max_rooms,
                "Room budget exhausted, refusing creation"
            );
            return Err(GameError::CapacityExhausted);
        }

        for _ in 0..self.config.protocol.code_allocation_attempts {
            let code = game_codes::generate_game_code_with_config(&self.config.protocol);

            if self.lock_rooms().contains_key(&code) {
                continue;
            }

            // Spawn outside the lock; the actor setup is not free.
            let handle = spawn_room(
                code.clone(),
                max_rounds,
                genres.clone(),
                Arc::clone(&self.catalog),
                &self.room_config,
            );

            match self.lock_rooms().entry(code.clone()) {
                Entry::Vacant(entry) => {
                    entry.insert(handle.clone());
                    return Ok((code, handle));
                }
                Entry::Occupied(_) => {
                    // Lost a race for this code; the dropped handle closes
                    // the fresh actor's queue and it stops on its own.
                    continue;
                }
            }
        }

        tracing::warn!(
            attempts = self.config.protocol.code_allocation_attempts,
            "Could not allocate a free game code"
        );
        Err(GameError::CapacityExhausted)
    }

    /// Resolve a wire-form code to its room. Case-insensitive.
    pub fn lookup(&self, raw_code: &str) -> Option<RoomHandle> {
        let code = game_codes::canonicalize(raw_code);
        let handle = self.lock_rooms().get(&code).cloned()?;
        if handle.is_closed() {
            None
        } else {
            Some(handle)
        }
    }

    /// Remove a room and shut its actor down. Safe to call repeatedly.
    pub async fn dispose(&self, raw_code: &str, close_code: u16, reason: &str) {
        let code = game_codes::canonicalize(raw_code);
        let Some(handle) = self.lock_rooms().remove(&code) else {
            return;
        };
        tracing::info!(game_code = %code, %reason, "Disposing room");
        handle
            .notify(
                Origin::Internal,
                RoomCommand::Shutdown {
                    close_code,
                    reason: reason.to_string(),
                },
            )
            .await;
    }

    pub fn room_count(&self) -> usize {
        self.lock_rooms().len()
    }

    fn lock_rooms(&self) -> std::sync::MutexGuard<'_, HashMap<String, RoomHandle>> {
        // A poisoned registry mutex means a panic mid map-operation; the
        // map itself is still structurally sound, so keep serving.
        self.rooms
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Periodic sweep: reap stopped actors and dispose rooms that have had
    /// no attached sessions for longer than the idle TTL.
    pub async fn sweep_task(self: Arc<Self>) {
        let mut interval = tokio::time::interval(Duration::from_secs(
            self.config.server.room_sweep_interval.max(1),
        ));
        let idle_ttl_ms = i64::try_from(self.config.server.idle_room_ttl)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000);

        loop {
            interval.tick().await;

            let mut defunct = Vec::new();
            let mut idle = Vec::new();
            {
                let rooms = self.lock_rooms();
                for (code, handle) in rooms.iter() {
                    if handle.is_closed() {
                        defunct.push(code.clone());
                    } else if handle.meta().attached_sessions() == 0
                        && handle.meta().idle_for_ms() > idle_ttl_ms
                    {
                        idle.push(code.clone());
                    }
                }
            }

            if !defunct.is_empty() {
                let mut rooms = self.lock_rooms();
                for code in &defunct {
                    rooms.remove(code);
                }
                tracing::info!(count = defunct.len(), "Reaped stopped rooms");
            }

            for code in idle {
                tracing::info!(game_code = %code, "Room idle past TTL");
                self.dispose(&code, close_codes::ROOM_DISPOSED, "idle timeout")
                    .await;
            }
        }
    }
}
