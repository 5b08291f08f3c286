//! Operation registry: declared operations and descriptors per tool type.
//!
//! A tool type lists its agent-callable operations in
//! [`GovernedTool::declare`]. The registry turns that declaration into a
//! dispatch table of [`OperationDescriptor`]s and handlers, builds it once per
//! type, and caches it by [`TypeId`]. Nothing outside the declaration is ever
//! callable through the proxy.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use toolwarden_core::{OperationDescriptor, RiskTier};
use toolwarden_events::ProgressChannel;
use tracing::debug;

use crate::error::{InvocationError, InvocationResult, ToolError, ToolResult};
use crate::policy::PolicyClassifier;

/// A tool whose operations are governed by the proxy.
///
/// # Example
///
/// ```rust
/// use serde_json::Value;
/// use toolwarden_core::RiskTier;
/// use toolwarden_tools::{Arguments, GovernedTool, OperationTable, ToolResult};
///
/// struct Notes;
///
/// impl Notes {
///     fn count(&self, _args: Arguments) -> ToolResult {
///         Ok(Value::from(3))
///     }
/// }
///
/// impl GovernedTool for Notes {
///     fn tool_name(&self) -> &str {
///         "notes"
///     }
///
///     fn declare(ops: &mut OperationTable<Self>) {
///         ops.declare("count", Self::count).tier(RiskTier::Safe);
///     }
/// }
/// ```
pub trait GovernedTool: Send + Sync + Sized + 'static {
    /// Identity of this tool instance, shown in prompts and logs.
    fn tool_name(&self) -> &str;

    /// Register every agent-callable operation with its handler.
    fn declare(ops: &mut OperationTable<Self>);

    /// The tool's progress channel, if it publishes progress.
    fn progress(&self) -> Option<&ProgressChannel> {
        None
    }
}

/// Handler for one declared operation.
pub type Handler<T> = Arc<dyn Fn(&T, Arguments) -> ToolResult + Send + Sync>;

/// Positional arguments of an invocation, addressable by parameter name.
#[derive(Debug, Clone)]
pub struct Arguments {
    descriptor: Arc<OperationDescriptor>,
    values: Vec<Value>,
}

impl Arguments {
    /// Pair values with the descriptor that names them.
    #[must_use]
    pub fn new(descriptor: Arc<OperationDescriptor>, values: Vec<Value>) -> Self {
        Self { descriptor, values }
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if there are no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw value of parameter `name`.
    #[must_use]
    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.descriptor
            .parameters
            .iter()
            .position(|p| p == name)
            .and_then(|index| self.values.get(index))
    }

    /// Deserialize parameter `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidArguments`] if the parameter is missing or
    /// has the wrong shape.
    pub fn get<D: DeserializeOwned>(&self, name: &str) -> ToolResult<D> {
        let raw = self.raw(name).ok_or_else(|| {
            ToolError::InvalidArguments(format!(
                "'{}' has no parameter '{name}'",
                self.descriptor.name
            ))
        })?;
        serde_json::from_value(raw.clone())
            .map_err(|e| ToolError::InvalidArguments(format!("parameter '{name}': {e}")))
    }

    /// String parameter `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidArguments`] if it is missing or not a string.
    pub fn str(&self, name: &str) -> ToolResult<&str> {
        self.raw(name).and_then(Value::as_str).ok_or_else(|| {
            ToolError::InvalidArguments(format!("parameter '{name}' must be a string"))
        })
    }
}

struct OperationEntry<T> {
    name: String,
    display_name: Option<String>,
    parameters: Vec<String>,
    parameter_declarations: usize,
    tier: Option<RiskTier>,
    handler: Handler<T>,
}

/// Builder for a tool type's operation declarations.
pub struct OperationTable<T> {
    entries: Vec<OperationEntry<T>>,
}

impl<T: GovernedTool> OperationTable<T> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Declare an operation and its handler.
    ///
    /// With no further calls the operation takes no parameters and has no
    /// tier annotation, so it resolves to `Unknown`.
    pub fn declare<F>(&mut self, name: impl Into<String>, handler: F) -> OperationDecl<'_, T>
    where
        F: Fn(&T, Arguments) -> ToolResult + Send + Sync + 'static,
    {
        let index = self.entries.len();
        self.entries.push(OperationEntry {
            name: name.into(),
            display_name: None,
            parameters: Vec::new(),
            parameter_declarations: 0,
            tier: None,
            handler: Arc::new(handler),
        });
        OperationDecl {
            table: self,
            index,
        }
    }
}

/// Chained settings for one declared operation.
pub struct OperationDecl<'a, T> {
    table: &'a mut OperationTable<T>,
    index: usize,
}

impl<T> OperationDecl<'_, T> {
    fn entry(&mut self) -> Option<&mut OperationEntry<T>> {
        self.table.entries.get_mut(self.index)
    }

    /// Set the name shown to humans.
    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        if let Some(entry) = self.entry() {
            entry.display_name = Some(display_name.into());
        }
        self
    }

    /// Set the ordered parameter names.
    pub fn params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(entry) = self.entry() {
            entry.parameters = params.into_iter().map(Into::into).collect();
            entry.parameter_declarations = entry.parameter_declarations.saturating_add(1);
        }
        self
    }

    /// Annotate the risk tier.
    pub fn tier(mut self, tier: RiskTier) -> Self {
        if let Some(entry) = self.entry() {
            entry.tier = Some(tier);
        }
        self
    }
}

/// The validated dispatch table of one tool type.
pub(crate) struct OperationSet<T> {
    owner: String,
    descriptors: Vec<Arc<OperationDescriptor>>,
    handlers: Vec<Handler<T>>,
    index: HashMap<String, usize>,
}

impl<T: GovernedTool> OperationSet<T> {
    fn build() -> InvocationResult<Self> {
        let owner = short_type_name::<T>();
        let mut table = OperationTable::new();
        T::declare(&mut table);

        let mut descriptors = Vec::with_capacity(table.entries.len());
        let mut handlers = Vec::with_capacity(table.entries.len());
        let mut index = HashMap::with_capacity(table.entries.len());

        for entry in table.entries {
            validate_entry(&owner, &entry, &index)?;

            let descriptor = OperationDescriptor::new(owner.as_str(), entry.name.as_str())
                .with_display_name(entry.display_name.unwrap_or_else(|| entry.name.clone()))
                .with_parameters(entry.parameters)
                .with_declared_tier(entry.tier);
            let tier = PolicyClassifier::classify(&descriptor);

            index.insert(entry.name, descriptors.len());
            descriptors.push(Arc::new(descriptor.with_tier(tier)));
            handlers.push(entry.handler);
        }

        debug!(owner = %owner, operations = descriptors.len(), "Built operation table");
        Ok(Self {
            owner,
            descriptors,
            handlers,
            index,
        })
    }

    pub(crate) fn owner(&self) -> &str {
        &self.owner
    }

    pub(crate) fn descriptors(&self) -> &[Arc<OperationDescriptor>] {
        &self.descriptors
    }

    pub(crate) fn find(&self, name: &str) -> Option<(&Arc<OperationDescriptor>, &Handler<T>)> {
        let position = *self.index.get(name)?;
        Some((self.descriptors.get(position)?, self.handlers.get(position)?))
    }

    pub(crate) fn not_registered(&self, name: &str) -> InvocationError {
        InvocationError::NotRegistered {
            owner: self.owner.clone(),
            operation: name.to_owned(),
        }
    }
}

fn validate_entry<T>(
    owner: &str,
    entry: &OperationEntry<T>,
    seen: &HashMap<String, usize>,
) -> InvocationResult<()> {
    let invalid = |message: String| Err(InvocationError::Configuration(format!("{owner}: {message}")));

    if entry.name.trim().is_empty() {
        return invalid("operation name must not be blank".to_owned());
    }
    if seen.contains_key(&entry.name) {
        return invalid(format!("operation '{}' is declared twice", entry.name));
    }
    if entry.parameter_declarations > 1 {
        return invalid(format!(
            "operation '{}' declares its parameters more than once",
            entry.name
        ));
    }
    let mut names = HashSet::new();
    if let Some(dup) = entry.parameters.iter().find(|p| !names.insert(p.as_str())) {
        return invalid(format!(
            "operation '{}' has duplicate parameter '{dup}'",
            entry.name
        ));
    }
    Ok(())
}

/// `my_crate::tools::Workbench<X>` -> `Workbench`.
fn short_type_name<T>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_owned()
}

/// Per-type cache of operation tables.
///
/// Safe for concurrent use. A type's table is built on first use; concurrent
/// first lookups may each build it, but only one copy is ever stored and
/// returned.
#[derive(Default)]
pub struct OperationRegistry {
    tables: DashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl OperationRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Descriptor of operation `name` on tool type `T`.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationError::NotRegistered`] if `T` does not declare
    /// `name`, or [`InvocationError::Configuration`] if `T`'s declarations
    /// are invalid.
    pub fn lookup<T: GovernedTool>(&self, name: &str) -> InvocationResult<Arc<OperationDescriptor>> {
        let set = self.operations::<T>()?;
        set.find(name)
            .map(|(descriptor, _)| Arc::clone(descriptor))
            .ok_or_else(|| set.not_registered(name))
    }

    /// All descriptors of tool type `T`, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationError::Configuration`] if `T`'s declarations are
    /// invalid.
    pub fn descriptors<T: GovernedTool>(&self) -> InvocationResult<Vec<Arc<OperationDescriptor>>> {
        Ok(self.operations::<T>()?.descriptors().to_vec())
    }

    /// Number of tool types with a cached table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Check if no table has been built yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub(crate) fn operations<T: GovernedTool>(&self) -> InvocationResult<Arc<OperationSet<T>>> {
        let key = TypeId::of::<T>();
        let cached = self.tables.get(&key).map(|entry| Arc::clone(entry.value()));
        let erased = match cached {
            Some(erased) => erased,
            None => {
                // Build outside the map so a failing declaration is not cached
                // and user code never runs under a shard lock.
                let built: Arc<dyn Any + Send + Sync> = Arc::new(OperationSet::<T>::build()?);
                let entry = self.tables.entry(key).or_insert(built);
                Arc::clone(entry.value())
            },
        };
        erased.downcast::<OperationSet<T>>().map_err(|_| {
            InvocationError::Configuration(format!(
                "cached operation table for {} has the wrong type",
                short_type_name::<T>()
            ))
        })
    }
}

impl std::fmt::Debug for OperationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationRegistry")
            .field("types", &self.tables.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Editor;

    impl GovernedTool for Editor {
        fn tool_name(&self) -> &str {
            "editor"
        }

        fn declare(ops: &mut OperationTable<Self>) {
            ops.declare("open", |_: &Editor, args: Arguments| {
                Ok(Value::String(args.str("path")?.to_owned()))
            })
            .display_name("Open File")
            .params(["path"])
            .tier(RiskTier::Interactive);
            ops.declare("save", |_: &Editor, _| Ok(Value::Null))
                .params(["path", "content"])
                .tier(RiskTier::Sensitive);
            ops.declare("format", |_: &Editor, _| Ok(Value::Null));
        }
    }

    struct Duplicated;

    impl GovernedTool for Duplicated {
        fn tool_name(&self) -> &str {
            "duplicated"
        }

        fn declare(ops: &mut OperationTable<Self>) {
            ops.declare("run", |_: &Duplicated, _| Ok(Value::Null));
            ops.declare("run", |_: &Duplicated, _| Ok(Value::Null));
        }
    }

    struct Blank;

    impl GovernedTool for Blank {
        fn tool_name(&self) -> &str {
            "blank"
        }

        fn declare(ops: &mut OperationTable<Self>) {
            ops.declare("  ", |_: &Blank, _| Ok(Value::Null));
        }
    }

    struct TwiceParams;

    impl GovernedTool for TwiceParams {
        fn tool_name(&self) -> &str {
            "twice"
        }

        fn declare(ops: &mut OperationTable<Self>) {
            ops.declare("copy", |_: &TwiceParams, _| Ok(Value::Null))
                .params(["from"])
                .params(["from", "to"]);
        }
    }

    #[test]
    fn test_descriptors_in_declaration_order() {
        let registry = OperationRegistry::new();
        let names: Vec<_> = registry
            .descriptors::<Editor>()
            .unwrap()
            .iter()
            .map(|d| d.name.clone())
            .collect();
        assert_eq!(names, ["open", "save", "format"]);
    }

    #[test]
    fn test_lookup_metadata() {
        let registry = OperationRegistry::new();
        let open = registry.lookup::<Editor>("open").unwrap();
        assert_eq!(open.display_name, "Open File");
        assert_eq!(open.parameters, ["path"]);
        assert_eq!(open.tier, RiskTier::Interactive);
        assert_eq!(open.owner, "Editor");

        let format = registry.lookup::<Editor>("format").unwrap();
        assert_eq!(format.display_name, "format");
        assert_eq!(format.declared_tier, None);
        assert_eq!(format.tier, RiskTier::Unknown);
    }

    #[test]
    fn test_lookup_unknown_operation() {
        let registry = OperationRegistry::new();
        let err = registry.lookup::<Editor>("delete_everything").unwrap_err();
        assert!(matches!(
            err,
            InvocationError::NotRegistered { ref operation, .. } if operation == "delete_everything"
        ));
    }

    #[test]
    fn test_descriptors_cached_per_type() {
        let registry = OperationRegistry::new();
        let first = registry.lookup::<Editor>("save").unwrap();
        let second = registry.lookup::<Editor>("save").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_invalid_declarations() {
        let registry = OperationRegistry::new();
        for err in [
            registry.descriptors::<Duplicated>().unwrap_err(),
            registry.descriptors::<Blank>().unwrap_err(),
            registry.descriptors::<TwiceParams>().unwrap_err(),
        ] {
            assert!(matches!(err, InvocationError::Configuration(_)), "{err}");
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_concurrent_first_lookup_shares_table() {
        let registry = Arc::new(OperationRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.lookup::<Editor>("open").unwrap())
            })
            .collect();
        let descriptors: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(descriptors.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_arguments_by_name() {
        let registry = OperationRegistry::new();
        let save = registry.lookup::<Editor>("save").unwrap();
        let args = Arguments::new(save, vec![Value::from("a.rs"), Value::from("fn main() {}")]);
        assert_eq!(args.str("path").unwrap(), "a.rs");
        assert_eq!(args.get::<String>("content").unwrap(), "fn main() {}");
        assert!(args.get::<u32>("path").is_err());
        assert!(args.str("mode").is_err());
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<Editor>(), "Editor");
        assert_eq!(short_type_name::<Vec<Editor>>(), "Vec");
    }
}
