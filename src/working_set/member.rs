//! Working set members

use std::collections::BTreeMap;

use serde_json::Value;

use crate::status::Status;
use crate::storage::{Document, RecordLocation};

/// What a member currently holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberState {
    /// Only the record location is known; the document still has to be fetched
    LocationOnly,
    /// The document was read from `location` and still mirrors it
    LocationAndDocument,
    /// The document is owned by the member and tied to no location
    OwnedDocument,
    /// The member describes a failure
    Status,
}

impl MemberState {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberState::LocationOnly => "LOC_ONLY",
            MemberState::LocationAndDocument => "LOC_AND_DOC",
            MemberState::OwnedDocument => "OWNED_DOC",
            MemberState::Status => "STATUS",
        }
    }
}

/// One in-flight document plus its metadata
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingSetMember {
    state: MemberState,
    location: Option<RecordLocation>,
    document: Option<Document>,
    computed: BTreeMap<String, Value>,
    status: Option<Status>,
}

impl WorkingSetMember {
    /// A member that only knows where its record lives
    pub fn with_location(location: RecordLocation) -> Self {
        Self {
            state: MemberState::LocationOnly,
            location: Some(location),
            document: None,
            computed: BTreeMap::new(),
            status: None,
        }
    }

    /// A member holding a document read from `location`
    pub fn with_location_and_document(location: RecordLocation, document: Document) -> Self {
        Self {
            state: MemberState::LocationAndDocument,
            location: Some(location),
            document: Some(document),
            computed: BTreeMap::new(),
            status: None,
        }
    }

    /// A member owning a document not backed by storage
    pub fn with_owned_document(document: Document) -> Self {
        Self {
            state: MemberState::OwnedDocument,
            location: None,
            document: Some(document),
            computed: BTreeMap::new(),
            status: None,
        }
    }

    /// A member describing a failure
    pub fn with_status(status: Status) -> Self {
        Self {
            state: MemberState::Status,
            location: None,
            document: None,
            computed: BTreeMap::new(),
            status: Some(status),
        }
    }

    /// Adds a computed field (builder style)
    pub fn with_computed(mut self, name: impl Into<String>, value: Value) -> Self {
        self.computed.insert(name.into(), value);
        self
    }

    /// Returns the member state
    pub fn state(&self) -> MemberState {
        self.state
    }

    /// Returns the backing record location, if any
    pub fn location(&self) -> Option<RecordLocation> {
        self.location
    }

    /// Returns true if the member is backed by a record location
    pub fn has_location(&self) -> bool {
        self.location.is_some()
    }

    /// Returns true if the member holds a document
    pub fn has_document(&self) -> bool {
        self.document.is_some()
    }

    /// Returns the document, if any
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// Returns the document mutably, if any
    pub fn document_mut(&mut self) -> Option<&mut Document> {
        self.document.as_mut()
    }

    /// Takes the document out of the member
    pub fn take_document(&mut self) -> Option<Document> {
        self.document.take()
    }

    /// Returns the failure status, if this is a status member
    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    /// Returns a computed field
    pub fn computed(&self, name: &str) -> Option<&Value> {
        self.computed.get(name)
    }

    /// Sets a computed field
    pub fn set_computed(&mut self, name: impl Into<String>, value: Value) {
        self.computed.insert(name.into(), value);
    }

    /// Replaces the document and detaches the member from storage.
    ///
    /// The new document no longer mirrors any record.
    pub fn replace_with_owned(&mut self, document: Document) {
        self.document = Some(document);
        self.location = None;
        self.state = MemberState::OwnedDocument;
    }

    /// Keeps the current document as an owned copy and drops the location.
    ///
    /// Returns false if there is no document to keep.
    pub fn transition_to_owned_document(&mut self) -> bool {
        if self.document.is_none() {
            return false;
        }
        self.location = None;
        self.state = MemberState::OwnedDocument;
        true
    }
}
