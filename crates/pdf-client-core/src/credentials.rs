//! API credential records and the lists that manage them.
//!
//! Two kinds of credentials exist: parse API tokens (for the document parsing
//! backend) and translate API endpoints (OpenAI-compatible). Both kinds share
//! the same lifecycle and selection rules, so the list logic is written once
//! over the [`Credential`] trait and [`CredentialManager`] dispatches on
//! [`CredentialKind`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::store::ConfigStore;

/// Token for the document parsing API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseCredential {
    pub id: i64,
    pub name: String,
    pub token: String,
}

/// Endpoint, key and model of an OpenAI-compatible translation API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateCredential {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKind {
    Parse,
    Translate,
}

impl CredentialKind {
    /// Prefix of auto-generated record names
    pub const fn label(self) -> &'static str {
        match self {
            Self::Parse => "API Key",
            Self::Translate => "Translate AI",
        }
    }

    /// Shown instead of the list when it has no records
    pub const fn placeholder(self) -> &'static str {
        match self {
            Self::Parse => "No parse API configured, the server default key is used",
            Self::Translate => "No translate API configured, the server default is used",
        }
    }

    /// Notification posted when a record of this kind is selected
    pub const fn selected_message(self) -> &'static str {
        match self {
            Self::Parse => "Parse API selected",
            Self::Translate => "Translate API selected",
        }
    }
}

impl std::fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse => write!(f, "parse API"),
            Self::Translate => write!(f, "translate API"),
        }
    }
}

/// One displayed field of a credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldView {
    pub name: &'static str,
    pub value: String,
    pub secret: bool,
}

/// Behaviour shared by both credential records
pub trait Credential: Clone + Serialize + DeserializeOwned {
    const KIND: CredentialKind;

    /// A fresh record with every field other than id and name empty
    fn new(id: i64, name: String) -> Self;

    fn id(&self) -> i64;

    fn name(&self) -> &str;

    /// Set the named field. Returns `false` if the record has no such field.
    fn set_field(&mut self, field: &str, value: String) -> bool;

    /// Editable fields in display order
    fn fields(&self) -> Vec<FieldView>;
}

impl Credential for ParseCredential {
    const KIND: CredentialKind = CredentialKind::Parse;

    fn new(id: i64, name: String) -> Self {
        Self {
            id,
            name,
            token: String::new(),
        }
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_field(&mut self, field: &str, value: String) -> bool {
        match field {
            "name" => self.name = value,
            "token" => self.token = value,
            _ => return false,
        }
        true
    }

    fn fields(&self) -> Vec<FieldView> {
        vec![
            FieldView { name: "name", value: self.name.clone(), secret: false },
            FieldView { name: "token", value: self.token.clone(), secret: true },
        ]
    }
}

impl Credential for TranslateCredential {
    const KIND: CredentialKind = CredentialKind::Translate;

    fn new(id: i64, name: String) -> Self {
        Self {
            id,
            name,
            url: String::new(),
            api_key: String::new(),
            model: String::new(),
        }
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_field(&mut self, field: &str, value: String) -> bool {
        match field {
            "name" => self.name = value,
            "url" => self.url = value,
            "apiKey" | "api_key" => self.api_key = value,
            "model" => self.model = value,
            _ => return false,
        }
        true
    }

    fn fields(&self) -> Vec<FieldView> {
        vec![
            FieldView { name: "name", value: self.name.clone(), secret: false },
            FieldView { name: "url", value: self.url.clone(), secret: false },
            FieldView { name: "apiKey", value: self.api_key.clone(), secret: true },
            FieldView { name: "model", value: self.model.clone(), secret: false },
        ]
    }
}

/// Source of record ids
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch
    fn now_millis(&self) -> i64;
}

/// Wall clock
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
    }
}

/// Asks the user to confirm a destructive action
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F: Fn(&str) -> bool> Confirm for F {
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Prompt shown before a record is removed
pub const REMOVE_PROMPT: &str = "Delete this API configuration?";

/// A rendered credential record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialView {
    pub id: i64,
    pub name: String,
    pub selected: bool,
    pub fields: Vec<FieldView>,
}

/// Rendered state of one credential list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListView {
    Empty { placeholder: &'static str },
    Items(Vec<CredentialView>),
}

impl ListView {
    pub fn items(&self) -> &[CredentialView] {
        match self {
            Self::Empty { .. } => &[],
            Self::Items(items) => items,
        }
    }
}

/// Pure rendering of records with the given selection marked.
///
/// Does not apply the default-to-first rule; see [`CredentialList::render`].
pub fn render_list<C: Credential>(records: &[C], selected: Option<i64>) -> Vec<CredentialView> {
    records
        .iter()
        .map(|record| CredentialView {
            id: record.id(),
            name: record.name().to_string(),
            selected: selected == Some(record.id()),
            fields: record.fields(),
        })
        .collect()
}

/// Ordered records of one kind plus the current selection
#[derive(Debug, Clone)]
pub struct CredentialList<C> {
    items: Vec<C>,
    selected: Option<i64>,
}

impl<C: Credential> CredentialList<C> {
    pub const fn new(items: Vec<C>) -> Self {
        Self {
            items,
            selected: None,
        }
    }

    pub fn items(&self) -> &[C] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub const fn selected_id(&self) -> Option<i64> {
        self.selected
    }

    /// The selected record, if the selection points at an existing one
    pub fn selected(&self) -> Option<&C> {
        let id = self.selected?;
        self.items.iter().find(|c| c.id() == id)
    }

    /// Append a new record named `"<label> <n>"`.
    ///
    /// The id is `now_ms` unless that would not be greater than every
    /// existing id, in which case it is bumped past the largest one.
    pub fn add(&mut self, now_ms: i64) -> &C {
        let id = self
            .items
            .iter()
            .map(|c| c.id())
            .max()
            .map_or(now_ms, |max| now_ms.max(max.saturating_add(1)));
        let name = format!("{} {}", C::KIND.label(), self.items.len() + 1);

        debug!("Adding {} '{}' ({})", C::KIND, name, id);
        self.items.push(C::new(id, name));
        &self.items[self.items.len() - 1]
    }

    /// Set one field of a record.
    ///
    /// Unknown ids are ignored and yield `Ok(false)`.
    pub fn update(&mut self, id: i64, field: &str, value: String) -> Result<bool> {
        let Some(record) = self.items.iter_mut().find(|c| c.id() == id) else {
            debug!("Ignoring update of unknown {} {}", C::KIND, id);
            return Ok(false);
        };

        if record.set_field(field, value) {
            Ok(true)
        } else {
            Err(Error::UnknownField {
                kind: C::KIND.label(),
                field: field.to_string(),
            })
        }
    }

    /// Remove a record after confirmation. Returns whether anything changed.
    pub fn remove(&mut self, id: i64, confirm: &dyn Confirm) -> bool {
        if !confirm.confirm(REMOVE_PROMPT) {
            return false;
        }

        let before = self.items.len();
        self.items.retain(|c| c.id() != id);
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.items.len() != before
    }

    pub fn select(&mut self, id: i64) {
        self.selected = Some(id);
    }

    /// Render the list, defaulting the selection to the first record.
    ///
    /// An empty list clears the selection.
    pub fn render(&mut self) -> ListView {
        let Some(first) = self.items.first() else {
            self.selected = None;
            return ListView::Empty {
                placeholder: C::KIND.placeholder(),
            };
        };

        if self.selected.is_none() {
            self.selected = Some(first.id());
        }

        ListView::Items(render_list(&self.items, self.selected))
    }
}

/// Both credential lists, persisted through a [`ConfigStore`] after every
/// mutation. A mutation whose save fails is undone in memory as well.
pub struct CredentialManager {
    store: ConfigStore,
    clock: Arc<dyn Clock>,
    parse: CredentialList<ParseCredential>,
    translate: CredentialList<TranslateCredential>,
}

type Snapshot = (
    CredentialList<ParseCredential>,
    CredentialList<TranslateCredential>,
);

impl CredentialManager {
    /// Load persisted lists and apply the default selections
    pub fn init(store: ConfigStore, clock: Arc<dyn Clock>) -> Self {
        let (parse, translate) = store.load();
        debug!(
            "Loaded {} parse and {} translate credentials",
            parse.len(),
            translate.len()
        );

        let mut manager = Self {
            store,
            clock,
            parse: CredentialList::new(parse),
            translate: CredentialList::new(translate),
        };
        manager.render(CredentialKind::Parse);
        manager.render(CredentialKind::Translate);
        manager
    }

    pub const fn parse(&self) -> &CredentialList<ParseCredential> {
        &self.parse
    }

    pub const fn translate(&self) -> &CredentialList<TranslateCredential> {
        &self.translate
    }

    pub fn add(&mut self, kind: CredentialKind) -> Result<ListView> {
        let now = self.clock.now_millis();
        let before = self.snapshot();
        match kind {
            CredentialKind::Parse => {
                self.parse.add(now);
            }
            CredentialKind::Translate => {
                self.translate.add(now);
            }
        }
        self.commit(before)?;
        Ok(self.render(kind))
    }

    /// Set one field. Unknown ids are a silent no-op and are not persisted.
    pub fn update(
        &mut self,
        kind: CredentialKind,
        id: i64,
        field: &str,
        value: impl Into<String>,
    ) -> Result<bool> {
        let value = value.into();
        let before = self.snapshot();
        let changed = match kind {
            CredentialKind::Parse => self.parse.update(id, field, value)?,
            CredentialKind::Translate => self.translate.update(id, field, value)?,
        };
        if changed {
            self.commit(before)?;
        }
        Ok(changed)
    }

    pub fn remove(
        &mut self,
        kind: CredentialKind,
        id: i64,
        confirm: &dyn Confirm,
    ) -> Result<ListView> {
        let before = self.snapshot();
        let removed = match kind {
            CredentialKind::Parse => self.parse.remove(id, confirm),
            CredentialKind::Translate => self.translate.remove(id, confirm),
        };
        if removed {
            self.commit(before)?;
        }
        Ok(self.render(kind))
    }

    pub fn select(&mut self, kind: CredentialKind, id: i64) -> ListView {
        match kind {
            CredentialKind::Parse => self.parse.select(id),
            CredentialKind::Translate => self.translate.select(id),
        }
        self.render(kind)
    }

    pub fn render(&mut self, kind: CredentialKind) -> ListView {
        match kind {
            CredentialKind::Parse => self.parse.render(),
            CredentialKind::Translate => self.translate.render(),
        }
    }

    fn snapshot(&self) -> Snapshot {
        (self.parse.clone(), self.translate.clone())
    }

    /// Save both lists, or put back `before` if storage refuses
    fn commit(&mut self, before: Snapshot) -> Result<()> {
        if let Err(e) = self.store.save(self.parse.items(), self.translate.items()) {
            warn!("Credential change not saved, reverting: {}", e);
            (self.parse, self.translate) = before;
            return Err(e);
        }
        Ok(())
    }
}
