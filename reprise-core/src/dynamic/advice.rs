//! Gate for cache-style interception points

use super::MethodInfo;
use crate::config::RepriseConfig;
use crate::context::ContextProvider;

/// Whether a cache-advised method should be recorded or replayed
///
/// Only methods configured as dynamic classes qualify: the class must
/// match, the method name must match, and when the entry lists parameter
/// types they must match the method's exactly.
pub fn need_record_or_replay(
    provider: &dyn ContextProvider,
    config: &RepriseConfig,
    method: Option<&MethodInfo>,
) -> bool {
    if !provider.need_record_or_replay() {
        return false;
    }

    let Some(method) = method else {
        return false;
    };

    config.dynamic_classes.iter().any(|entity| {
        entity.class_name == method.type_name
            && entity.method_name.as_deref() == Some(method.method_name.as_str())
            && entity
                .parameter_types
                .as_ref()
                .is_none_or(|types| *types == method.parameter_types)
    })
}
