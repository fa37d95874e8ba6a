//! Link and relation resolution.
//!
//! A relation resolves from two places: the `_links` section (templates
//! expanded when variables are given) and the `_embedded` section (each
//! embedded resource contributes its own self-href). Misuse is reported to
//! the diagnostics sink and never fails resolution.

use crate::collaborators::{DiagnosticsSink, TemplateExpander, TemplateVars};
use crate::context::Context;
use crate::resource::ResourceEntity;
use halgraph_hal::OneOrMany;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Resolves the href or hrefs of a relation on an entity.
///
/// Link hrefs come first, then embedded self-hrefs. The result is an array
/// when either section holds an array or both sections contribute; `None`
/// when the relation appears in neither section.
///
/// Diagnostics, each at most once per call: a templated link resolved
/// without variables (the unexpanded template is still returned), variables
/// supplied where a contributing link is non-templated or embedded, and one
/// warning per distinct deprecation URI.
pub fn resolve_href(
    entity: &ResourceEntity,
    rel: &str,
    vars: Option<&TemplateVars>,
    expander: &dyn TemplateExpander,
    diagnostics: &dyn DiagnosticsSink,
) -> Option<OneOrMany<String>> {
    let links = entity.link(rel);
    let embedded = entity.embedded_hrefs(rel);
    if links.is_none() && embedded.is_none() {
        return None;
    }

    let mut hrefs = Vec::new();
    let mut many = links.is_some() && embedded.is_some();
    let mut templated_without_vars = false;
    let mut vars_without_template = false;
    let mut deprecations = BTreeSet::new();

    if let Some(links) = &links {
        many |= links.is_many();
        for link in links.iter() {
            if link.is_templated() && vars.is_none() {
                templated_without_vars = true;
            }
            if !link.is_templated() && vars.is_some() {
                vars_without_template = true;
            }
            if let Some(deprecation) = &link.deprecation {
                deprecations.insert(deprecation.clone());
            }
            let href = match vars {
                Some(vars) if link.is_templated() => expander.expand(&link.href, vars),
                _ => link.href.clone(),
            };
            hrefs.push(href);
        }
    }

    if let Some(embedded) = &embedded {
        many |= embedded.is_many();
        if vars.is_some() && !embedded.is_empty() {
            vars_without_template = true;
        }
        hrefs.extend(embedded.iter().cloned());
    }

    if templated_without_vars {
        diagnostics.warn(&format!(
            "following templated link relation '{rel}' without variables"
        ));
    }
    if vars_without_template {
        diagnostics.warn(&format!(
            "ignoring variables for non-templated link relation '{rel}'"
        ));
    }
    for deprecation in deprecations {
        diagnostics.warn(&format!(
            "following deprecated link relation '{rel}': {deprecation}"
        ));
    }

    if many {
        Some(OneOrMany::Many(hrefs))
    } else {
        Some(OneOrMany::One(hrefs.pop()?))
    }
}

/// Resolves a relation to the entity or entities it points at.
///
/// Maps [`resolve_href`] through the context's identity map, preserving the
/// scalar-vs-array shape. Targets not yet materialized are created
/// unpopulated.
pub fn resolve_relation(
    context: &Context,
    entity: &ResourceEntity,
    rel: &str,
    vars: Option<&TemplateVars>,
) -> Option<OneOrMany<Arc<ResourceEntity>>> {
    let hrefs = resolve_href(
        entity,
        rel,
        vars,
        context.expander(),
        context.diagnostics(),
    )?;
    Some(hrefs.map(|href| context.get(href)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{RecordingSink, SimpleExpander};
    use crate::profile::ProfileRegistry;
    use halgraph_hal::Link;
    use std::sync::Arc;

    fn resolve(
        entity: &ResourceEntity,
        rel: &str,
        vars: Option<&TemplateVars>,
    ) -> (Option<OneOrMany<String>>, Vec<String>) {
        let sink = RecordingSink::new();
        let result = resolve_href(entity, rel, vars, &SimpleExpander, &sink);
        (result, sink.messages())
    }

    fn vars(pairs: &[(&str, &str)]) -> TemplateVars {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn resolves_single_link() {
        let entity = ResourceEntity::new("http://example.com");
        entity.set_link("example", Link::new("http://x/1"));

        let (result, warnings) = resolve(&entity, "example", None);
        assert_eq!(result, Some(OneOrMany::One("http://x/1".to_string())));
        assert!(warnings.is_empty());
    }

    #[test]
    fn resolves_array_links() {
        let entity = ResourceEntity::new("http://example.com");
        entity.set_link(
            "example",
            vec![Link::new("http://x/1"), Link::new("http://x/2")],
        );

        let (result, _) = resolve(&entity, "example", None);
        assert_eq!(
            result,
            Some(OneOrMany::Many(vec![
                "http://x/1".to_string(),
                "http://x/2".to_string()
            ]))
        );
    }

    #[test]
    fn expands_templated_link() {
        let entity = ResourceEntity::new("http://example.com");
        entity.set_link("example", Link::new("http://x/{id}").templated());

        let (result, warnings) = resolve(&entity, "example", Some(&vars(&[("id", "1")])));
        assert_eq!(result, Some(OneOrMany::One("http://x/1".to_string())));
        assert!(warnings.is_empty());
    }

    #[test]
    fn warns_on_templated_link_without_vars() {
        let entity = ResourceEntity::new("http://example.com");
        entity.set_link("example", Link::new("http://x/{id}").templated());

        let (result, warnings) = resolve(&entity, "example", None);
        // The unexpanded template is still returned.
        assert_eq!(result, Some(OneOrMany::One("http://x/{id}".to_string())));
        assert_eq!(
            warnings,
            ["following templated link relation 'example' without variables"]
        );
    }

    #[test]
    fn warns_on_vars_for_plain_link() {
        let entity = ResourceEntity::new("http://example.com");
        entity.set_link("example", Link::new("http://x/1"));

        let (result, warnings) = resolve(&entity, "example", Some(&vars(&[("id", "1")])));
        assert_eq!(result, Some(OneOrMany::One("http://x/1".to_string())));
        assert_eq!(
            warnings,
            ["ignoring variables for non-templated link relation 'example'"]
        );
    }

    #[test]
    fn warns_once_per_distinct_deprecation() {
        let entity = ResourceEntity::new("http://example.com");
        entity.set_link(
            "example",
            vec![
                Link::new("http://x/1").deprecated("http://x/docs/gone"),
                Link::new("http://x/2").deprecated("http://x/docs/gone"),
            ],
        );

        let (_, warnings) = resolve(&entity, "example", None);
        assert_eq!(
            warnings,
            ["following deprecated link relation 'example': http://x/docs/gone"]
        );
    }

    #[test]
    fn embedded_resources_contribute_self_hrefs() {
        let entity = ResourceEntity::new("http://example.com");
        entity.set_embedded("car", "http://x/car".to_string());

        let (result, warnings) = resolve(&entity, "car", None);
        assert_eq!(result, Some(OneOrMany::One("http://x/car".to_string())));
        assert!(warnings.is_empty());
    }

    #[test]
    fn links_and_embedded_concatenate_as_array() {
        let entity = ResourceEntity::new("http://example.com");
        entity.set_link("item", Link::new("http://x/1"));
        entity.set_embedded("item", "http://x/2".to_string());

        let (result, _) = resolve(&entity, "item", None);
        assert_eq!(
            result,
            Some(OneOrMany::Many(vec![
                "http://x/1".to_string(),
                "http://x/2".to_string()
            ]))
        );
    }

    #[test]
    fn unknown_relation_is_none() {
        let entity = ResourceEntity::new("http://example.com");
        let (result, warnings) = resolve(&entity, "missing", None);
        assert_eq!(result, None);
        assert!(warnings.is_empty());
    }

    #[test]
    fn relation_resolution_preserves_shape_and_identity() {
        let registry = Arc::new(ProfileRegistry::new());
        let context = Context::new(registry);
        let entity = context.get("http://example.com");
        let target = context.get("http://x/1");

        entity.set_link("one", Link::new("http://x/1"));
        entity.set_link(
            "many",
            vec![Link::new("http://x/1"), Link::new("http://x/2")],
        );

        match resolve_relation(&context, &entity, "one", None) {
            Some(OneOrMany::One(resolved)) => assert!(Arc::ptr_eq(&resolved, &target)),
            other => panic!("expected single entity, got {other:?}"),
        }

        match resolve_relation(&context, &entity, "many", None) {
            Some(OneOrMany::Many(resolved)) => {
                assert_eq!(resolved.len(), 2);
                assert!(Arc::ptr_eq(&resolved[0], &target));
            }
            other => panic!("expected entity array, got {other:?}"),
        }

        assert!(resolve_relation(&context, &entity, "missing", None).is_none());
    }
}
