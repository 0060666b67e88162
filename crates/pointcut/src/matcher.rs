//! Evaluation of a compiled expression against one candidate element.
//!
//! Evaluation is a pure function of the immutable tree and the caller's
//! [`MatchContext`]; no state is shared between calls, so any number of
//! threads may match against the same compiled expression concurrently.

use pointcut_patterns::{HierarchyMode, TypePattern};

use crate::CompiledExpression;
use crate::ast::{
    ClassFilter, ExpressionNode, FieldPattern, MemberPattern, ParameterPattern, WithinCodeTarget,
};
use crate::descriptor::{
    ElementDescriptor, ElementKind, JoinPointKind, MemberDescriptor, TypeDescriptor,
};
use crate::errors::ResolutionError;

/// Maps pointcut reference names to compiled expressions.
///
/// Resolution is deliberately external: the engine records reference names
/// at parse time and asks the caller for their meaning at match time.
pub trait ReferenceResolver {
    /// Look up the expression a reference name stands for.
    fn resolve(&self, name: &str) -> Option<&CompiledExpression>;
}

impl ReferenceResolver for std::collections::HashMap<String, CompiledExpression> {
    fn resolve(&self, name: &str) -> Option<&CompiledExpression> {
        self.get(name)
    }
}

/// Everything the matcher may consult for one match call.
///
/// The context borrows the caller's descriptor and is cheap to construct per
/// call. The join-point kind defaults from the element kind (a method
/// descriptor is its execution) and is overridden for call sites and field
/// writes.
#[derive(Clone, Copy)]
pub struct MatchContext<'a> {
    /// The candidate join point.
    pub element: &'a ElementDescriptor,
    /// What kind of join point the candidate stands for.
    pub join_point: JoinPointKind,
    /// Enclosing call-stack frames, most recent first, for `cflow` and
    /// `cflowbelow`. Empty when the caller tracks no control flow.
    pub cflow: &'a [ElementDescriptor],
    /// Resolver for pointcut references, when the expression uses any.
    pub resolver: Option<&'a dyn ReferenceResolver>,
}

impl<'a> MatchContext<'a> {
    /// Context for an element with the default join-point kind, no call
    /// stack and no resolver.
    #[must_use]
    pub fn new(element: &'a ElementDescriptor) -> Self {
        Self {
            element,
            join_point: JoinPointKind::for_element(element.kind),
            cflow: &[],
            resolver: None,
        }
    }

    /// Override the join-point kind.
    #[must_use]
    pub fn with_join_point(mut self, join_point: JoinPointKind) -> Self {
        self.join_point = join_point;
        self
    }

    /// Supply the enclosing call stack, most recent frame first.
    #[must_use]
    pub fn with_cflow(mut self, frames: &'a [ElementDescriptor]) -> Self {
        self.cflow = frames;
        self
    }

    /// Supply a resolver for pointcut references.
    #[must_use]
    pub fn with_resolver(mut self, resolver: &'a dyn ReferenceResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }
}

/// Evaluate one node against the context.
///
/// # Errors
/// Returns [`ResolutionError`] when a pointcut reference cannot be resolved;
/// this aborts only the current match call.
pub(crate) fn evaluate(
    node: &ExpressionNode,
    ctx: &MatchContext<'_>,
) -> Result<bool, ResolutionError> {
    match node {
        ExpressionNode::And(a, b) => Ok(evaluate(a, ctx)? && evaluate(b, ctx)?),
        ExpressionNode::Or(a, b) => Ok(evaluate(a, ctx)? || evaluate(b, ctx)?),
        ExpressionNode::Not(a) => Ok(!evaluate(a, ctx)?),
        ExpressionNode::Execution(member) => {
            Ok(ctx.join_point == JoinPointKind::Execution && member_matches(member, ctx.element))
        }
        ExpressionNode::Call(member) => {
            Ok(ctx.join_point == JoinPointKind::Call && member_matches(member, ctx.element))
        }
        ExpressionNode::Get(field) => {
            Ok(ctx.join_point == JoinPointKind::Get && field_matches(field, ctx.element))
        }
        ExpressionNode::Set(field) => {
            Ok(ctx.join_point == JoinPointKind::Set && field_matches(field, ctx.element))
        }
        ExpressionNode::Within(filter) => Ok(class_filter_matches(filter, within_type(ctx.element))),
        ExpressionNode::WithinCode(target) => Ok(withincode_matches(target, ctx.element)),
        ExpressionNode::Handler(filter) => Ok(ctx.join_point == JoinPointKind::Handler
            && ctx.element.kind == ElementKind::Handler
            && class_filter_matches(filter, &ctx.element.declaring_type)),
        ExpressionNode::StaticInitialization(filter) => {
            Ok(ctx.join_point == JoinPointKind::StaticInitialization
                && ctx.element.kind == ElementKind::StaticInitializer
                && class_filter_matches(filter, &ctx.element.declaring_type))
        }
        ExpressionNode::Cflow(sub) => any_frame_matches(sub, ctx.cflow.iter(), ctx),
        ExpressionNode::CflowBelow(sub) => any_frame_matches(sub, ctx.cflow.iter().skip(1), ctx),
        ExpressionNode::Args(entries) => Ok(args_match(entries, ctx.element)),
        ExpressionNode::Target(pattern) => {
            Ok(!ctx.element.modifiers.is_static() && is_a(pattern, &ctx.element.declaring_type))
        }
        ExpressionNode::This(pattern) => {
            let (ty, modifiers) = ctx.element.enclosing.as_deref().map_or(
                (&ctx.element.declaring_type, ctx.element.modifiers),
                |enclosing| (&enclosing.declaring_type, enclosing.modifiers),
            );
            Ok(!modifiers.is_static() && is_a(pattern, ty))
        }
        // Always true here: the runtime condition is an external evaluator's
        // concern, which locates the marker via the tree walker.
        ExpressionNode::If => Ok(true),
        ExpressionNode::HasMethod(member) => Ok(ctx
            .element
            .declaring_type
            .methods
            .iter()
            .any(|m| declared_member_matches(member, m, &ctx.element.declaring_type))),
        ExpressionNode::HasField(field) => Ok(ctx
            .element
            .declaring_type
            .fields
            .iter()
            .any(|f| declared_field_matches(field, f, &ctx.element.declaring_type))),
        ExpressionNode::Reference(reference) => {
            let resolved = ctx
                .resolver
                .and_then(|r| r.resolve(&reference.name))
                .ok_or_else(|| ResolutionError::new(&reference.name))?;
            evaluate(resolved.root(), ctx)
        }
    }
}

/// `cflow`/`cflowbelow`: does any supplied frame satisfy the nested
/// expression? Frames are evaluated with their own default join-point kind
/// and an empty stack of their own.
fn any_frame_matches<'a>(
    sub: &ExpressionNode,
    frames: impl Iterator<Item = &'a ElementDescriptor>,
    ctx: &MatchContext<'_>,
) -> Result<bool, ResolutionError> {
    for frame in frames {
        let frame_ctx = MatchContext {
            element: frame,
            join_point: JoinPointKind::for_element(frame.kind),
            cflow: &[],
            resolver: ctx.resolver,
        };
        if evaluate(sub, &frame_ctx)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// The type a join point lexically lives in: the enclosing member's
/// declaring type when the join point is nested, its own otherwise.
fn within_type(element: &ElementDescriptor) -> &TypeDescriptor {
    element
        .enclosing
        .as_deref()
        .map_or(&element.declaring_type, |e| &e.declaring_type)
}

fn withincode_matches(target: &WithinCodeTarget, element: &ElementDescriptor) -> bool {
    let Some(enclosing) = element.enclosing.as_deref() else {
        return false;
    };
    match target {
        WithinCodeTarget::Member(member) => member_matches(member, enclosing),
        WithinCodeTarget::StaticInitialization(filter) => {
            enclosing.kind == ElementKind::StaticInitializer
                && class_filter_matches(filter, &enclosing.declaring_type)
        }
    }
}

/// Is-a test: the pattern matches the type's own name or any ancestor.
fn is_a(pattern: &TypePattern, ty: &TypeDescriptor) -> bool {
    pattern.matches_name(&ty.name) || ty.ancestors.iter().any(|a| pattern.matches_name(a))
}

/// Hierarchy-aware declaring-type test for a member.
fn declaring_type_matches(
    pattern: &TypePattern,
    ty: &TypeDescriptor,
    declared_on: Option<&str>,
) -> bool {
    match pattern.hierarchy_mode() {
        HierarchyMode::NotHierarchical => pattern.matches_name(&ty.name),
        HierarchyMode::AllSubtypes => is_a(pattern, ty),
        HierarchyMode::BaseTypeOnly => pattern.matches_name(declared_on.unwrap_or(&ty.name)),
    }
}

fn class_filter_matches(filter: &ClassFilter, ty: &TypeDescriptor) -> bool {
    filter.modifiers.matches(ty.modifiers)
        && filter.annotations.iter().all(|a| a.matches(&ty.annotations))
        && match filter.type_pattern.hierarchy_mode() {
            HierarchyMode::NotHierarchical | HierarchyMode::BaseTypeOnly => {
                filter.type_pattern.matches_name(&ty.name)
            }
            HierarchyMode::AllSubtypes => is_a(&filter.type_pattern, ty),
        }
}

fn member_matches(pattern: &MemberPattern, element: &ElementDescriptor) -> bool {
    match pattern {
        MemberPattern::Method(method) => {
            element.kind == ElementKind::Method
                && method.modifiers.matches(element.modifiers)
                && method.annotations.iter().all(|a| a.matches(&element.annotations))
                && method
                    .return_type
                    .matches_name(element.return_type.as_deref().unwrap_or("void"))
                && declaring_type_matches(
                    &method.declaring_type,
                    &element.declaring_type,
                    element.declared_on.as_deref(),
                )
                && method.name.matches(&element.name)
                && parameters_match(&method.parameters.entries, &element.parameter_types)
        }
        MemberPattern::Constructor(ctor) => {
            element.kind == ElementKind::Constructor
                && ctor.modifiers.matches(element.modifiers)
                && ctor.annotations.iter().all(|a| a.matches(&element.annotations))
                && declaring_type_matches(
                    &ctor.declaring_type,
                    &element.declaring_type,
                    element.declared_on.as_deref(),
                )
                && parameters_match(&ctor.parameters.entries, &element.parameter_types)
        }
        MemberPattern::Any {
            modifiers,
            annotations,
        } => {
            matches!(
                element.kind,
                ElementKind::Method | ElementKind::Constructor
            ) && modifiers.matches(element.modifiers)
                && annotations.iter().all(|a| a.matches(&element.annotations))
        }
    }
}

fn field_matches(pattern: &FieldPattern, element: &ElementDescriptor) -> bool {
    element.kind == ElementKind::Field
        && pattern.modifiers.matches(element.modifiers)
        && pattern.annotations.iter().all(|a| a.matches(&element.annotations))
        && pattern
            .field_type
            .matches_name(element.return_type.as_deref().unwrap_or(""))
        && declaring_type_matches(
            &pattern.declaring_type,
            &element.declaring_type,
            element.declared_on.as_deref(),
        )
        && pattern.name.matches(&element.name)
}

/// `hasmethod` test against one declared member of the candidate's type.
fn declared_member_matches(
    pattern: &MemberPattern,
    member: &MemberDescriptor,
    owner: &TypeDescriptor,
) -> bool {
    match pattern {
        MemberPattern::Method(method) => {
            method.modifiers.matches(member.modifiers)
                && method.annotations.iter().all(|a| a.matches(&member.annotations))
                && method
                    .return_type
                    .matches_name(member.value_type.as_deref().unwrap_or("void"))
                && declaring_type_matches(&method.declaring_type, owner, None)
                && method.name.matches(&member.name)
                && parameters_match(&method.parameters.entries, &member.parameter_types)
        }
        MemberPattern::Constructor(ctor) => {
            member.name == "new"
                && ctor.modifiers.matches(member.modifiers)
                && ctor.annotations.iter().all(|a| a.matches(&member.annotations))
                && declaring_type_matches(&ctor.declaring_type, owner, None)
                && parameters_match(&ctor.parameters.entries, &member.parameter_types)
        }
        MemberPattern::Any {
            modifiers,
            annotations,
        } => {
            modifiers.matches(member.modifiers)
                && annotations.iter().all(|a| a.matches(&member.annotations))
        }
    }
}

/// `hasfield` test against one declared field of the candidate's type.
fn declared_field_matches(
    pattern: &FieldPattern,
    field: &MemberDescriptor,
    owner: &TypeDescriptor,
) -> bool {
    pattern.modifiers.matches(field.modifiers)
        && pattern.annotations.iter().all(|a| a.matches(&field.annotations))
        && pattern
            .field_type
            .matches_name(field.value_type.as_deref().unwrap_or(""))
        && declaring_type_matches(&pattern.declaring_type, owner, None)
        && pattern.name.matches(&field.name)
}

/// `args(...)` argument types per join-point shape: methods and
/// constructors expose their parameter list, a field exposes its single
/// field type, a handler its single exception type.
fn args_match(entries: &[ParameterPattern], element: &ElementDescriptor) -> bool {
    match element.kind {
        ElementKind::Field => element.return_type.as_ref().map_or_else(
            || parameters_match(entries, &[]),
            |ty| parameters_match(entries, std::slice::from_ref(ty)),
        ),
        ElementKind::Handler if element.parameter_types.is_empty() => {
            parameters_match(entries, std::slice::from_ref(&element.declaring_type.name))
        }
        _ => parameters_match(entries, &element.parameter_types),
    }
}

/// Positional parameter matching with leading/trailing eager wildcards.
///
/// A trailing `..` matches from the left, a leading `..` matches from the
/// right, and both at once slide the fixed middle over the argument list.
fn parameters_match(entries: &[ParameterPattern], args: &[String]) -> bool {
    let mut inner = entries;
    let mut leading = false;
    let mut trailing = false;
    if let Some((first, rest)) = inner.split_first() {
        if matches!(first, ParameterPattern::Eager) {
            leading = true;
            inner = rest;
        }
    }
    if let Some((last, rest)) = inner.split_last() {
        if matches!(last, ParameterPattern::Eager) {
            trailing = true;
            inner = rest;
        }
    }
    let Some(types) = inner
        .iter()
        .map(|entry| match entry {
            ParameterPattern::Type(pattern) => Some(pattern),
            ParameterPattern::Eager => None,
        })
        .collect::<Option<Vec<_>>>()
    else {
        // A misplaced eager wildcard never reaches here via the parser.
        return false;
    };
    let pairwise = |patterns: &[&TypePattern], names: &[String]| {
        patterns
            .iter()
            .zip(names)
            .all(|(pattern, name)| pattern.matches_name(name))
    };
    match (leading, trailing) {
        (false, false) => types.len() == args.len() && pairwise(&types, args),
        (true, false) => {
            args.len() >= types.len() && {
                let skip = args.len() - types.len();
                args.iter()
                    .skip(skip)
                    .zip(&types)
                    .all(|(name, pattern)| pattern.matches_name(name))
            }
        }
        (false, true) => args.len() >= types.len() && pairwise(&types, args),
        (true, true) => {
            types.is_empty()
                || (args.len() >= types.len()
                    && args.windows(types.len()).any(|window| pairwise(&types, window)))
        }
    }
}
