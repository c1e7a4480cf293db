//! Fan-out of "project changed" events.
//!
//! Viewers of a project register either as a one-shot long-poll waiter or
//! as a member of the project's socket room. [`NotificationHub::publish`]
//! wakes every waiter and pushes to every room member registered at that
//! moment. Delivery is at most once: nothing is queued for viewers that
//! register later, and a publish with nobody listening is dropped.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use folio_types::{ProjectId, UserId};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::config::NotifyConfig;
use crate::error::NotifyResult;

/// Payload delivered to viewers: who changed the project.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Update {
    pub updated_by: UserId,
}

/// Identifies one registration (waiter or room member) within the hub.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Something pushed to a room member.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoomEvent {
    /// A commit landed on the project.
    Update(Update),
    /// Another member sent a message to the room.
    Relay(String),
}

/// How many registrations a publish reached.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Delivery {
    pub waiters: usize,
    pub members: usize,
}

impl Delivery {
    pub fn total(&self) -> usize {
        self.waiters + self.members
    }
}

#[derive(Default)]
struct Registry {
    waiters: HashMap<ProjectId, Vec<(ConnectionId, oneshot::Sender<Update>)>>,
    rooms: HashMap<ProjectId, HashMap<ConnectionId, mpsc::Sender<RoomEvent>>>,
    next_id: u64,
}

impl Registry {
    fn next_id(&mut self) -> ConnectionId {
        self.next_id += 1;
        ConnectionId(self.next_id)
    }

    fn remove_waiter(&mut self, project: &ProjectId, id: ConnectionId) {
        if let Some(list) = self.waiters.get_mut(project) {
            list.retain(|(waiter, _)| *waiter != id);
            if list.is_empty() {
                self.waiters.remove(project);
            }
        }
    }

    /// Push `event` to every member of the room except `skip`; evict
    /// members whose receiver is gone and drop the room once empty.
    fn broadcast(&mut self, project: &ProjectId, event: &RoomEvent, skip: Option<ConnectionId>) -> usize {
        let Some(room) = self.rooms.get_mut(project) else {
            return 0;
        };
        let mut delivered = 0;
        room.retain(|id, tx| {
            if Some(*id) == skip {
                return true;
            }
            match tx.try_send(event.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(%project, connection = %id, "room member lagging, event dropped");
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!(%project, connection = %id, "room member gone, evicted");
                    false
                }
            }
        });
        if room.is_empty() {
            self.rooms.remove(project);
        }
        delivered
    }
}

/// Process-wide notification hub. Cloning shares the same registrations.
#[derive(Clone)]
pub struct NotificationHub {
    registry: Arc<Mutex<Registry>>,
    config: NotifyConfig,
}

impl NotificationHub {
    pub fn new(config: NotifyConfig) -> NotifyResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: NotifyConfig) -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry::default())),
            config,
        }
    }

    pub fn config(&self) -> &NotifyConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        lock(&self.registry)
    }

    // -----------------------------------------------------------------------
    // Long poll
    // -----------------------------------------------------------------------

    /// Register a one-shot waiter for the next update of `project`.
    ///
    /// The waiter counts as present from this call until the returned
    /// handle resolves or is dropped.
    pub fn subscribe(&self, project: ProjectId) -> Subscription {
        let (tx, rx) = oneshot::channel();
        let id = {
            let mut registry = self.lock();
            let id = registry.next_id();
            registry.waiters.entry(project).or_default().push((id, tx));
            id
        };
        debug!(%project, connection = %id, "long-poll waiter registered");
        Subscription {
            project,
            id,
            rx,
            timeout: self.config.long_poll_timeout(),
            registry: Arc::clone(&self.registry),
        }
    }

    /// Wait for the next update of `project`, or `None` after the
    /// configured timeout.
    pub async fn wait_for_update(&self, project: ProjectId) -> Option<Update> {
        self.subscribe(project).wait().await
    }

    /// Number of long-poll waiters currently registered on `project`.
    pub fn waiting(&self, project: &ProjectId) -> usize {
        self.lock().waiters.get(project).map_or(0, Vec::len)
    }

    // -----------------------------------------------------------------------
    // Socket rooms
    // -----------------------------------------------------------------------

    /// Add a connection to `project`'s room, creating the room if needed.
    pub fn join(&self, project: ProjectId) -> RoomMember {
        let (tx, rx) = mpsc::channel(self.config.room_buffer);
        let mut registry = self.lock();
        let id = registry.next_id();
        registry.rooms.entry(project).or_default().insert(id, tx);
        debug!(%project, connection = %id, "joined room");
        RoomMember { project, id, rx }
    }

    /// Remove a connection; the room goes away with its last member.
    /// Returns whether the connection was in the room.
    pub fn leave(&self, project: &ProjectId, id: ConnectionId) -> bool {
        let mut registry = self.lock();
        let Some(room) = registry.rooms.get_mut(project) else {
            return false;
        };
        let removed = room.remove(&id).is_some();
        if room.is_empty() {
            registry.rooms.remove(project);
            debug!(%project, "room closed");
        }
        if removed {
            debug!(%project, connection = %id, "left room");
        }
        removed
    }

    /// Rebroadcast a message from one member to the rest of its room.
    pub fn relay(&self, project: &ProjectId, from: ConnectionId, message: impl Into<String>) -> usize {
        let event = RoomEvent::Relay(message.into());
        self.lock().broadcast(project, &event, Some(from))
    }

    /// Number of connections in `project`'s room.
    pub fn room_size(&self, project: &ProjectId) -> usize {
        self.lock().rooms.get(project).map_or(0, HashMap::len)
    }

    pub fn has_room(&self, project: &ProjectId) -> bool {
        self.lock().rooms.contains_key(project)
    }

    // -----------------------------------------------------------------------
    // Publish
    // -----------------------------------------------------------------------

    /// Tell every current viewer of `project` that `updated_by` changed it.
    ///
    /// Every waiting long-poll handle resolves. Every room member except
    /// `origin` receives the update. Never fails; with no viewers the event
    /// is dropped.
    pub fn publish(&self, project: &ProjectId, updated_by: &UserId, origin: Option<ConnectionId>) -> Delivery {
        let update = Update {
            updated_by: updated_by.clone(),
        };
        let mut registry = self.lock();

        let waiters = registry.waiters.remove(project).unwrap_or_default();
        let woken = waiters
            .into_iter()
            .filter_map(|(_, tx)| tx.send(update.clone()).ok())
            .count();
        let members = registry.broadcast(project, &RoomEvent::Update(update), origin);
        drop(registry);

        let delivery = Delivery {
            waiters: woken,
            members,
        };
        debug!(%project, %updated_by, waiters = woken, members, "update published");
        delivery
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::build(NotifyConfig::default())
    }
}

impl fmt::Debug for NotificationHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.lock();
        f.debug_struct("NotificationHub")
            .field("waiting_projects", &registry.waiters.len())
            .field("rooms", &registry.rooms.len())
            .field("config", &self.config)
            .finish()
    }
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A pending long-poll wait. Dropping it withdraws the registration.
pub struct Subscription {
    project: ProjectId,
    id: ConnectionId,
    rx: oneshot::Receiver<Update>,
    timeout: Duration,
    registry: Arc<Mutex<Registry>>,
}

impl Subscription {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Resolve with the next update, or `None` once the timeout elapses.
    pub async fn wait(mut self) -> Option<Update> {
        match tokio::time::timeout(self.timeout, &mut self.rx).await {
            Ok(Ok(update)) => Some(update),
            Ok(Err(_)) => None,
            Err(_) => {
                debug!(project = %self.project, connection = %self.id, "long-poll timed out");
                None
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        lock(&self.registry).remove_waiter(&self.project, self.id);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("project", &self.project)
            .field("id", &self.id)
            .finish()
    }
}

/// A connection's membership in a project room.
///
/// Events arrive on [`recv`](Self::recv). The hub keeps the sending side;
/// call [`NotificationHub::leave`] when the connection closes.
pub struct RoomMember {
    project: ProjectId,
    id: ConnectionId,
    rx: mpsc::Receiver<RoomEvent>,
}

impl RoomMember {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn project(&self) -> ProjectId {
        self.project
    }

    /// Next event, or `None` once the hub dropped this member.
    pub async fn recv(&mut self) -> Option<RoomEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<RoomEvent> {
        self.rx.try_recv().ok()
    }
}

impl fmt::Debug for RoomMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoomMember")
            .field("project", &self.project)
            .field("id", &self.id)
            .finish()
    }
}
