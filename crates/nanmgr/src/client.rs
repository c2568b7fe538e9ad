// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One connected application client (spec.md §3, §4.2).

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::callbacks::{EventCallback, SessionCallback};
use crate::ids::SessionId;
use crate::session::SessionState;
use crate::types::ConfigRequest;

pub struct ClientState {
    event_callback: Option<Box<dyn EventCallback>>,
    config_request: Option<ConfigRequest>,
    sessions: IndexMap<SessionId, SessionState>,
    next_session_seq: u32,
    /// One-shot callback handles for sessions removed by `terminateSession`
    /// or a firmware termination callback. A post-termination `updatePublish`
    /// / `updateSubscribe` / `sendMessage` consumes (removes) the entry the
    /// first time it lands here; a second one finds nothing and is silent.
    /// See spec.md §8 scenario 2 and the terminate-race policy in §4.6.
    terminated: HashMap<SessionId, Box<dyn SessionCallback>>,
}

impl ClientState {
    pub fn new(event_callback: Option<Box<dyn EventCallback>>) -> Self {
        Self {
            event_callback,
            config_request: None,
            sessions: IndexMap::new(),
            next_session_seq: 0,
            terminated: HashMap::new(),
        }
    }

    /// Mint the next session id local to this client. Ids are only ever
    /// handed out, never reused, so a stale id from a torn-down session
    /// never aliases a later one.
    pub fn next_session_id(&mut self) -> SessionId {
        let id = SessionId(self.next_session_seq);
        self.next_session_seq += 1;
        id
    }

    pub fn add_session(&mut self, id: SessionId, session: SessionState) {
        self.sessions.insert(id, session);
    }

    pub fn remove_session(&mut self, id: SessionId) -> Option<SessionState> {
        self.sessions.shift_remove(&id)
    }

    pub fn session_mut(&mut self, id: SessionId) -> Option<&mut SessionState> {
        self.sessions.get_mut(&id)
    }

    pub fn sessions(&self) -> impl Iterator<Item = (&SessionId, &SessionState)> {
        self.sessions.iter()
    }

    pub fn sessions_mut(&mut self) -> impl Iterator<Item = (&SessionId, &mut SessionState)> {
        self.sessions.iter_mut()
    }

    pub fn config_request(&self) -> Option<&ConfigRequest> {
        self.config_request.as_ref()
    }

    pub fn set_config_request(&mut self, request: ConfigRequest) {
        self.config_request = Some(request);
    }

    pub fn event_callback(&mut self) -> Option<&mut dyn EventCallback> {
        self.event_callback.as_deref_mut()
    }

    /// Stash a just-removed session's callback for one later delivery.
    pub fn tombstone(&mut self, id: SessionId, callback: Box<dyn SessionCallback>) {
        self.terminated.insert(id, callback);
    }

    /// Consume the tombstone for `id`, if any. A second call for the same
    /// id returns `None`.
    pub fn take_tombstone(&mut self, id: SessionId) -> Option<Box<dyn SessionCallback>> {
        self.terminated.remove(&id)
    }
}
