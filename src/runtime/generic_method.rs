//! The generic method instantiation cache.
//!
//! [`GenericMethodCache`] turns [`GenericMethod`] keys into realized, callable
//! [`InflatedMethod`] descriptors and memoizes them for the lifetime of the cache.
//!
//! # Construction Protocol
//!
//! 1. Lock-free lookup in the instantiation map; a hit returns immediately.
//! 2. On a miss the metadata lock is taken and the map is checked again, since another
//!    thread may have finished the same key while this one waited.
//! 3. The pending set is checked. A hit means this thread is already constructing the
//!    key further up its stack, and the incomplete descriptor is returned as-is.
//! 4. A new descriptor is registered as pending, its declaring type realized, its
//!    signature inflated and its dispatch resolved.
//! 5. The descriptor is published, inserted into the instantiation map and removed from
//!    the pending set, all before the lock is released.
//!
//! A construction that fails leaves neither a cache nor a pending entry behind, so a
//! later request retries from scratch.
//!
//! # Thread Safety
//!
//! Lookups of completed keys never block on construction. All construction is serialized
//! by the shared [`MetadataLock`], which the constructing thread may re-enter through
//! collaborator callbacks.

use std::sync::Arc;

use crate::{
    metadata::{
        method::{
            GenericContext, GenericMethod, GenericMethodRc, InflatedMethod, InflatedMethodRc,
            MethodRef, PendingMethod, RealizationBuilder,
        },
        typesystem::{format_full_name, RuntimeTypeRc},
    },
    runtime::{
        CacheConfig, Collaborators, DispatchResolver, InstantiationMap, InstantiationStats,
        MetadataLock, StatsSnapshot,
    },
    Error, Result,
};

/// A request for a generic method instance
#[derive(Debug, Clone, Copy)]
pub enum MethodRequest<'a> {
    /// Construct (or look up) the instance named by the key
    Instantiate(&'a GenericMethodRc),
    /// The caller hit the generic recursion limit while building the key
    TooDeeplyNested,
}

/// Removes a pending registration when construction ends, successfully or not
struct PendingEntry<'a> {
    pending: &'a InstantiationMap,
    key: GenericMethodRc,
}

impl Drop for PendingEntry<'_> {
    fn drop(&mut self) {
        self.pending.remove(&self.key);
    }
}

/// Cache and constructor of generic method instances
///
/// # Examples
///
/// ```rust
/// use methodinst::prelude::*;
/// use std::sync::Arc;
///
/// let helpers = Arc::new(RuntimeType::new(Token::type_def(1), "", "Helpers", false));
/// let int32 = Arc::new(RuntimeType::new(Token::type_def(2), "System", "Int32", true));
/// let map = Arc::new(
///     MethodDefinition::new(Token::method_def(1), "Map", helpers)
///         .with_generic_params(vec![GenericParameter::new("T", 0)]),
/// );
///
/// let cache = GenericMethodCache::new(Collaborators::new());
/// let key = Arc::new(GenericMethod::new(
///     map,
///     GenericContext::new(None, Some(GenericInst::new(vec![TypeSig::Type(int32)]))),
/// ));
///
/// let first = cache.get_method(&key, false)?;
/// let second = cache.get_method(&key, false)?;
/// assert!(Arc::ptr_eq(&first, &second));
/// assert_eq!(cache.format_full_name(&key), "Helpers::Map<System.Int32>");
/// # Ok::<(), methodinst::Error>(())
/// ```
pub struct GenericMethodCache {
    methods: InstantiationMap,
    pending: InstantiationMap,
    lock: Arc<MetadataLock>,
    collaborators: Collaborators,
    config: CacheConfig,
    stats: InstantiationStats,
}

impl GenericMethodCache {
    /// Create an empty cache with its own metadata lock
    ///
    /// ## Arguments
    /// * `collaborators` - The subsystems used during construction
    pub fn new(collaborators: Collaborators) -> Self {
        Self::with_lock(collaborators, Arc::new(MetadataLock::new()))
    }

    /// Create an empty cache sharing an existing metadata lock
    ///
    /// ## Arguments
    /// * `collaborators` - The subsystems used during construction
    /// * `lock`          - The metadata lock of the embedding runtime
    pub fn with_lock(collaborators: Collaborators, lock: Arc<MetadataLock>) -> Self {
        GenericMethodCache {
            methods: InstantiationMap::new(),
            pending: InstantiationMap::new(),
            lock,
            collaborators,
            config: CacheConfig::default(),
            stats: InstantiationStats::new(),
        }
    }

    /// Replace the configuration
    #[must_use]
    pub fn with_config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// The active configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// The metadata lock serializing construction
    pub fn metadata_lock(&self) -> &Arc<MetadataLock> {
        &self.lock
    }

    /// The subsystems used during construction
    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    /// Get the realized instance for a key, constructing it on first use.
    ///
    /// Keys nested deeper than [`CacheConfig::max_generic_nesting`] are answered with a
    /// fresh placeholder whose entry point fails with [`Error::GenericNestingTooDeep`].
    ///
    /// ## Arguments
    /// * `key`       - The instantiation
    /// * `copy_key`  - Store a private copy of the key instead of sharing the caller's
    ///
    /// # Errors
    /// Returns [`Error::InvalidInstantiation`] for keys rejected by validation and
    /// [`Error::UnresolvableInstantiation`] if the declaring type cannot be realized
    pub fn get_method(&self, key: &GenericMethodRc, copy_key: bool) -> Result<InflatedMethodRc> {
        let depth = key.nesting_depth();
        if self.config.exceeds_nesting_limit(depth) {
            tracing::warn!(
                method = %self.format_full_name(key),
                depth,
                limit = self.config.max_generic_nesting,
                "generic method nesting limit exceeded"
            );
            return self.request_method(MethodRequest::TooDeeplyNested, copy_key);
        }

        self.request_method(MethodRequest::Instantiate(key), copy_key)
    }

    /// Serve a request without applying the nesting limit
    ///
    /// ## Arguments
    /// * `request`   - The key to instantiate, or the recursion-limit signal
    /// * `copy_key`  - Store a private copy of the key instead of sharing the caller's
    ///
    /// # Errors
    /// See [`GenericMethodCache::get_method`]
    pub fn request_method(
        &self,
        request: MethodRequest<'_>,
        copy_key: bool,
    ) -> Result<InflatedMethodRc> {
        let key = match request {
            MethodRequest::Instantiate(key) => key,
            MethodRequest::TooDeeplyNested => {
                self.stats.record_degenerate();
                return Ok(Arc::new(InflatedMethod::nesting_too_deep()));
            }
        };

        if let Some(existing) = self.methods.try_get(key) {
            self.stats.record_fast_hit();
            tracing::trace!(token = %key.definition().token, "generic method cache hit");
            return Ok(existing);
        }

        if self.config.validate_keys {
            Self::validate_key(key)?;
        }

        self.create_method_locked(key, copy_key)
    }

    /// Resolve the target of a generic virtual call.
    ///
    /// Combines the class arguments of the method occupying the vtable slot with the method
    /// arguments of the generic virtual method that was called.
    ///
    /// ## Arguments
    /// * `vtable_slot_method`      - The override found in the receiver's vtable
    /// * `generic_virtual_method`  - The instantiated virtual method at the call site
    ///
    /// # Errors
    /// Returns [`Error::NotGenericInstance`] if either method is the nesting placeholder,
    /// otherwise the errors of [`GenericMethodCache::get_method`]
    pub fn get_virtual_dispatch_target(
        &self,
        vtable_slot_method: &MethodRef,
        generic_virtual_method: &InflatedMethod,
    ) -> Result<InflatedMethodRc> {
        let (definition, class_inst) = match vtable_slot_method {
            MethodRef::Definition(definition) => (definition.clone(), None),
            MethodRef::Inflated(method) => {
                let key = method
                    .generic_method()
                    .ok_or(Error::NotGenericInstance(method.token()))?;
                (key.definition().clone(), key.context().class_inst.clone())
            }
        };

        let method_inst = generic_virtual_method
            .context()
            .ok_or(Error::NotGenericInstance(generic_virtual_method.token()))?
            .method_inst
            .clone();

        let key = Arc::new(GenericMethod::new(
            definition,
            GenericContext::new(class_inst, method_inst),
        ));

        // Freshly built, nobody else holds this key
        self.get_method(&key, false)
    }

    /// `DeclaringType<ClassArgs>::Method<MethodArgs>` of a key, for diagnostics
    pub fn format_full_name(&self, key: &GenericMethod) -> String {
        format_full_name(self.collaborators.names.as_ref(), key)
    }

    /// The type arguments of a key
    pub fn context<'k>(&self, key: &'k GenericMethod) -> &'k GenericContext {
        key.context()
    }

    /// Drop every cached and pending instance.
    ///
    /// Must not run concurrently with lookups or constructions. Statistics are kept.
    pub fn reset_all(&self) {
        self.methods.clear();
        self.pending.clear();
    }

    /// Number of cached instances
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Returns `true` if nothing is cached
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Number of instances currently under construction
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Snapshot of the cache statistics
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    fn validate_key(key: &GenericMethod) -> Result<()> {
        let definition = key.definition();
        let Some(method_inst) = &key.context().method_inst else {
            return Ok(());
        };

        if !definition.is_generic() {
            return Err(instantiation_error!(
                "{}::{} is not a generic method but was given {} method arguments",
                definition.declaring_type.fullname(),
                definition.name,
                method_inst.len()
            ));
        }

        if definition.generic_params.len() != method_inst.len() {
            return Err(instantiation_error!(
                "{}::{} expects {} method arguments, got {}",
                definition.declaring_type.fullname(),
                definition.name,
                definition.generic_params.len(),
                method_inst.len()
            ));
        }

        Ok(())
    }

    fn resolve_declaring_type(&self, key: &GenericMethod) -> Result<RuntimeTypeRc> {
        let declaring_type = &key.definition().declaring_type;
        match &key.context().class_inst {
            Some(class_inst) => self
                .collaborators
                .realizer
                .realize_type(declaring_type, class_inst),
            None => Ok(declaring_type.clone()),
        }
    }

    #[tracing::instrument(level = "debug", skip_all, fields(token = %key.definition().token))]
    fn create_method_locked(
        &self,
        key: &GenericMethodRc,
        copy_key: bool,
    ) -> Result<InflatedMethodRc> {
        let _guard = self.lock.lock();

        if let Some(existing) = self.methods.try_get(key) {
            self.stats.record_recheck_hit();
            return Ok(existing);
        }

        if let Some(pending) = self.pending.try_get(key) {
            self.stats.record_recursion_hit();
            tracing::debug!("returning pending generic method to recursive request");
            return Ok(pending);
        }

        let key = if copy_key {
            Arc::new(GenericMethod::clone(key))
        } else {
            key.clone()
        };

        let method = Arc::new(InflatedMethod::new(key.clone()));
        self.pending.add(key.clone(), method.clone());
        let pending_entry = PendingEntry {
            pending: &self.pending,
            key: key.clone(),
        };

        let declaring_type = match self.resolve_declaring_type(&key) {
            Ok(declaring_type) => declaring_type,
            Err(error) => {
                drop(pending_entry);
                self.stats.record_failure();

                let name = self.format_full_name(&key);
                tracing::warn!(method = %name, %error, "unable to realize declaring type");
                return Err(Error::UnresolvableInstantiation {
                    method: name,
                    source: Box::new(error),
                });
            }
        };

        let definition = key.definition();
        let context = key.context();
        let inflater = &self.collaborators.inflater;

        let mut builder = RealizationBuilder::new();
        builder.return_type = definition
            .return_type
            .as_ref()
            .map(|ty| inflater.inflate_type(ty, context));
        builder.parameters = inflater.inflate_parameters(&definition.parameters, context);

        if context.method_inst.is_none() {
            builder.is_generic = definition.is_generic();
            if !declaring_type.is_generic_instance() {
                builder.generic_container = definition.generic_container;
            }
            builder.metadata_handle = definition.metadata_handle;
        } else {
            builder.rgctx_data = definition.image().and_then(|image| {
                self.collaborators
                    .context_data
                    .resolve_context_data(image, definition.token, context)
            });
        }
        builder.declaring_type = Some(declaring_type);

        let resolved = {
            let pending = PendingMethod::new(&method, &builder);
            DispatchResolver::new(&self.collaborators).resolve(definition, context, &pending)
        };
        builder.invoker = resolved.invoker;
        builder.dispatch = resolved.dispatch;

        method.publish(builder)?;
        self.methods.add(key.clone(), method.clone());
        drop(pending_entry);

        self.stats.record_inflated(resolved.dispatch.kind());
        tracing::debug!(dispatch = %resolved.dispatch, "inflated generic method");

        Ok(method)
    }
}
