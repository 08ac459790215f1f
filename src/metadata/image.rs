//! Per-image metadata consumed during method instantiation.
//!
//! A [`MetadataImage`] stands in for the loaded module that owns a set of type and method
//! definitions. The only image data the instantiation engine needs is the runtime generic
//! context (RGCTX) layout of each generic method: the list of types, classes and methods
//! the method body refers to through its generic parameters. When a method is
//! instantiated with method-level arguments, these definitions are inflated into the
//! per-instantiation [`RuntimeContextData`] blob.
//!
//! # Thread Safety
//!
//! RGCTX layouts are stored in a `SkipMap` indexed by method token with append-only
//! `boxcar` lists as values, so layouts can be registered while other threads resolve.

use std::sync::Arc;

use crossbeam_skiplist::SkipMap;

use crate::{
    metadata::{
        method::{GenericContext, GenericMethod, MethodDefinitionRc},
        token::Token,
        typesystem::{ContextInflater, TypeSig},
    },
    runtime::{ContextDataResolver, SignatureInflater},
};

/// A list of RGCTX definitions of one method
pub type RgctxList = Arc<boxcar::Vec<RgctxDefinition>>;

/// One uninflated slot of a method's runtime generic context
#[derive(Clone, Debug)]
pub enum RgctxDefinition {
    /// A type handle, e.g. for `typeof(T)`
    Type(TypeSig),
    /// A class that must be initialized, e.g. for `new List<T>()`
    Class(TypeSig),
    /// A generic method called from the body, e.g. `Helper<T>()`
    Method(MethodDefinitionRc, GenericContext),
}

/// One inflated slot of a method's runtime generic context
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RgctxEntry {
    /// Inflated type handle
    Type(TypeSig),
    /// Inflated class reference
    Class(TypeSig),
    /// Key of the inflated callee, resolved to a descriptor on first call
    Method(GenericMethod),
}

/// Runtime generic context data of one generic method instance
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeContextData {
    entries: Arc<[RgctxEntry]>,
}

impl RuntimeContextData {
    /// Create context data from inflated entries
    pub fn new(entries: Vec<RgctxEntry>) -> Self {
        RuntimeContextData {
            entries: entries.into(),
        }
    }

    /// The inflated entries, in slot order
    pub fn entries(&self) -> &[RgctxEntry] {
        &self.entries
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the method uses no runtime generic context
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A loaded image owning metadata definitions
pub struct MetadataImage {
    /// Module name of the image
    pub name: String,
    rgctx: SkipMap<Token, RgctxList>,
}

impl MetadataImage {
    /// Create an empty image
    ///
    /// ## Arguments
    /// * `name` - The module name
    pub fn new(name: impl Into<String>) -> Self {
        MetadataImage {
            name: name.into(),
            rgctx: SkipMap::new(),
        }
    }

    /// Append an RGCTX slot to the layout of the method identified by `method`
    ///
    /// ## Arguments
    /// * `method`      - Token of the generic method definition
    /// * `definition`  - The slot to append
    pub fn add_rgctx(&self, method: Token, definition: RgctxDefinition) {
        self.rgctx
            .get_or_insert_with(method, || Arc::new(boxcar::Vec::new()))
            .value()
            .push(definition);
    }

    /// RGCTX layout of a method, if it has one
    pub fn rgctx(&self, method: Token) -> Option<RgctxList> {
        self.rgctx.get(&method).map(|entry| entry.value().clone())
    }
}

/// Reference [`ContextDataResolver`]: inflates an image's RGCTX layouts with a
/// [`ContextInflater`]
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageContextResolver {
    inflater: ContextInflater,
}

impl ImageContextResolver {
    /// Create a new resolver
    pub fn new() -> Self {
        ImageContextResolver {
            inflater: ContextInflater::new(),
        }
    }

    fn inflate_context(&self, open: &GenericContext, context: &GenericContext) -> GenericContext {
        GenericContext::new(
            open.class_inst
                .as_ref()
                .map(|inst| self.inflater.inflate_inst(inst, context)),
            open.method_inst
                .as_ref()
                .map(|inst| self.inflater.inflate_inst(inst, context)),
        )
    }
}

impl ContextDataResolver for ImageContextResolver {
    fn resolve_context_data(
        &self,
        image: &MetadataImage,
        token: Token,
        context: &GenericContext,
    ) -> Option<RuntimeContextData> {
        let layout = image.rgctx(token)?;

        let entries = layout
            .iter()
            .map(|(_, definition)| match definition {
                RgctxDefinition::Type(sig) => {
                    RgctxEntry::Type(self.inflater.inflate_type(sig, context))
                }
                RgctxDefinition::Class(sig) => {
                    RgctxEntry::Class(self.inflater.inflate_type(sig, context))
                }
                RgctxDefinition::Method(method, open) => RgctxEntry::Method(GenericMethod::new(
                    method.clone(),
                    self.inflate_context(open, context),
                )),
            })
            .collect();

        Some(RuntimeContextData::new(entries))
    }
}
