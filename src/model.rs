// chat_viewport - A scroll-stable message viewport for chat clients
// Copyright (C) 2025  Simon Peter Rothgang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Message identity and content types shared by the engine, the store and the UI.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier assigned by the server once a message is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServerId(pub String);

impl ServerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Client-generated correlation id for optimistic sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocalId(pub Uuid);

impl LocalId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The key a message is deduplicated and addressed by.
///
/// A message with a local correlation id resolves to it even after the server
/// assigns an id, so identity survives the local -> server migration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKey {
    Local(LocalId),
    Server(ServerId),
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(id) => write!(f, "local:{id}"),
            Self::Server(id) => write!(f, "{id}"),
        }
    }
}

impl From<ServerId> for MessageKey {
    fn from(id: ServerId) -> Self {
        Self::Server(id)
    }
}

impl From<LocalId> for MessageKey {
    fn from(id: LocalId) -> Self {
        Self::Local(id)
    }
}

/// `(serverId?, localCorrelationId?)`. Construct through [`MessageId::server`],
/// [`MessageId::local`] or [`MessageId::confirmed`] so at least one half is set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId {
    server: Option<ServerId>,
    local: Option<LocalId>,
}

impl MessageId {
    pub fn server(id: ServerId) -> Self {
        Self { server: Some(id), local: None }
    }

    pub fn local(id: LocalId) -> Self {
        Self { server: None, local: Some(id) }
    }

    pub fn confirmed(server: ServerId, local: LocalId) -> Self {
        Self { server: Some(server), local: Some(local) }
    }

    pub fn server_id(&self) -> Option<&ServerId> {
        self.server.as_ref()
    }

    pub fn local_id(&self) -> Option<LocalId> {
        self.local
    }

    /// Resolution key: local correlation id if present, else server id.
    pub fn key(&self) -> MessageKey {
        match (&self.local, &self.server) {
            (Some(local), _) => MessageKey::Local(*local),
            (None, Some(server)) => MessageKey::Server(server.clone()),
            // Unreachable through the constructors; keep a stable fallback anyway.
            (None, None) => MessageKey::Server(ServerId(String::new())),
        }
    }

    /// Every key this identity can be addressed by.
    pub fn keys(&self) -> impl Iterator<Item = MessageKey> + '_ {
        self.local
            .map(MessageKey::Local)
            .into_iter()
            .chain(self.server.clone().map(MessageKey::Server))
    }

    pub fn matches(&self, key: &MessageKey) -> bool {
        match key {
            MessageKey::Local(id) => self.local.as_ref() == Some(id),
            MessageKey::Server(id) => self.server.as_ref() == Some(id),
        }
    }

    /// True when the two identities share a local or a server id.
    pub fn same_message(&self, other: &Self) -> bool {
        let local = matches!((self.local, other.local), (Some(a), Some(b)) if a == b);
        let server =
            matches!((&self.server, &other.server), (Some(a), Some(b)) if a == b);
        local || server
    }

    /// Adopt a server id for a message previously known only locally.
    /// Returns `true` when the identity changed.
    pub fn assign_server(&mut self, id: ServerId) -> bool {
        if self.server.is_some() {
            return false;
        }
        self.server = Some(id);
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Text,
    Image,
    Sticker,
    File,
    Video,
    Album,
    Forwarded,
    Reply,
    System,
}

impl ContentKind {
    pub const ALL: [Self; 9] = [
        Self::Text,
        Self::Image,
        Self::Sticker,
        Self::File,
        Self::Video,
        Self::Album,
        Self::Forwarded,
        Self::Reply,
        Self::System,
    ];

    /// Kinds whose rendered height changes once their media finishes loading.
    pub fn has_media(self) -> bool {
        matches!(self, Self::Image | Self::Sticker | Self::Video | Self::Album)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Linkage {
    Reply { to: ServerId },
    Forward { from: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation: ConversationId,
    /// Creation time in unix milliseconds.
    pub created_at_ms: u64,
    pub kind: ContentKind,
    /// Text body, caption, or file name depending on `kind`.
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkage: Option<Linkage>,
}

impl Message {
    pub fn new(
        id: MessageId,
        conversation: ConversationId,
        created_at_ms: u64,
        kind: ContentKind,
        body: impl Into<String>,
    ) -> Self {
        Self { id, conversation, created_at_ms, kind, body: body.into(), linkage: None }
    }

    #[must_use]
    pub fn with_linkage(mut self, linkage: Linkage) -> Self {
        self.linkage = Some(linkage);
        self
    }

    pub fn key(&self) -> MessageKey {
        self.id.key()
    }

    pub fn is_reply(&self) -> bool {
        self.kind == ContentKind::Reply || matches!(self.linkage, Some(Linkage::Reply { .. }))
    }

    pub fn is_forwarded(&self) -> bool {
        self.kind == ContentKind::Forwarded || matches!(self.linkage, Some(Linkage::Forward { .. }))
    }

    pub fn reply_target(&self) -> Option<&ServerId> {
        match &self.linkage {
            Some(Linkage::Reply { to }) => Some(to),
            _ => None,
        }
    }
}
