//! Match-time behaviour of compiled expressions against descriptors.

#![expect(clippy::expect_used, reason = "tests assert the compile and match paths")]

use std::cell::Cell;
use std::collections::HashMap;

use rstest::rstest;

use pointcut::{
    CompiledExpression, ElementDescriptor, ElementKind, JoinPointKind, MatchContext,
    MemberDescriptor, Modifiers, ReferenceResolver, TypeDescriptor, compile,
};

fn compile_ok(text: &str) -> CompiledExpression {
    compile(text).expect("expression should compile")
}

fn matches(text: &str, element: &ElementDescriptor) -> bool {
    compile_ok(text)
        .matches(&MatchContext::new(element))
        .expect("no references involved")
}

fn baz_method() -> ElementDescriptor {
    ElementDescriptor::new(ElementKind::Method, "baz", TypeDescriptor::new("foo.Bar"))
        .with_modifiers(Modifiers::PUBLIC)
        .with_return_type("void")
        .with_parameter_types(["int", "java.lang.String"])
}

#[test]
fn canonical_execution_example() {
    assert!(matches("execution(* foo.Bar.*(..))", &baz_method()));

    let other = ElementDescriptor::new(ElementKind::Method, "baz", TypeDescriptor::new("foo.Baz"))
        .with_return_type("void");
    assert!(!matches("execution(* foo.Bar.*(..))", &other));
}

#[test]
fn boolean_laws_hold_per_descriptor() {
    let element = baz_method();
    let hit = "execution(* foo.Bar.*(..))";
    let miss = "execution(* no.Match.*(..))";
    assert!(!matches(&format!("!{hit}"), &element));
    assert!(matches(&format!("!{miss}"), &element));
    assert!(matches(&format!("{hit} && {hit}"), &element));
    assert!(!matches(&format!("{hit} && {miss}"), &element));
    assert!(matches(&format!("{miss} || {hit}"), &element));
    assert!(!matches(&format!("{miss} || {miss}"), &element));
}

struct CountingResolver {
    probe: CompiledExpression,
    calls: Cell<u32>,
}

impl CountingResolver {
    fn new(text: &str) -> Self {
        Self {
            probe: compile_ok(text),
            calls: Cell::new(0),
        }
    }
}

impl ReferenceResolver for CountingResolver {
    fn resolve(&self, name: &str) -> Option<&CompiledExpression> {
        self.calls.set(self.calls.get() + 1);
        (name == "probe").then_some(&self.probe)
    }
}

#[test]
fn and_short_circuits_on_a_false_left_operand() {
    let element = baz_method();
    let resolver = CountingResolver::new("if()");
    let expr = compile_ok("execution(* no.Match.*(..)) && probe");
    let ctx = MatchContext::new(&element).with_resolver(&resolver);
    assert_eq!(expr.matches(&ctx), Ok(false));
    assert_eq!(resolver.calls.get(), 0, "right operand must not be evaluated");
}

#[test]
fn or_short_circuits_on_a_true_left_operand() {
    let element = baz_method();
    let resolver = CountingResolver::new("if()");
    let expr = compile_ok("execution(* foo.Bar.*(..)) || probe");
    let ctx = MatchContext::new(&element).with_resolver(&resolver);
    assert_eq!(expr.matches(&ctx), Ok(true));
    assert_eq!(resolver.calls.get(), 0, "right operand must not be evaluated");
}

#[test]
fn references_resolve_through_the_context() {
    let element = baz_method();
    let resolver = CountingResolver::new("execution(* foo.Bar.*(..))");
    let expr = compile_ok("probe");
    let ctx = MatchContext::new(&element).with_resolver(&resolver);
    assert_eq!(expr.matches(&ctx), Ok(true));
    assert_eq!(resolver.calls.get(), 1);
}

#[test]
fn unresolved_references_fail_only_the_match_call() {
    let element = baz_method();
    let expr = compile_ok("missingRef");
    let err = expr
        .matches(&MatchContext::new(&element))
        .expect_err("expected a resolution error");
    assert_eq!(err.name, "missingRef");

    // The expression stays usable once a resolver is supplied.
    let mut table = HashMap::new();
    table.insert("missingRef".to_owned(), compile_ok("if()"));
    let ctx = MatchContext::new(&element).with_resolver(&table);
    assert_eq!(expr.matches(&ctx), Ok(true));
}

fn dog_method(name: &str) -> ElementDescriptor {
    let dog = TypeDescriptor::new("Dog").with_ancestors(["Animal", "java.lang.Object"]);
    ElementDescriptor::new(ElementKind::Method, name, dog).with_return_type("void")
}

#[test]
fn subtype_patterns_walk_the_ancestor_chain() {
    let element = dog_method("bark");
    assert!(matches("execution(* Animal+.*(..))", &element));
    assert!(!matches("execution(* Animal.*(..))", &element));
    assert!(matches("execution(* Dog.*(..))", &element));
}

#[test]
fn base_type_only_patterns_use_the_declared_on_type() {
    let inherited = dog_method("eat").with_declared_on("Animal");
    assert!(matches("execution(* Animal#.*(..))", &inherited));

    let own = dog_method("bark");
    assert!(!matches("execution(* Animal#.*(..))", &own));
}

#[test]
fn constructor_execution_matching() {
    let ctor =
        ElementDescriptor::new(ElementKind::Constructor, "new", TypeDescriptor::new("foo.Bar"))
            .with_parameter_types(["int"]);
    assert!(matches("execution(foo.Bar.new(..))", &ctor));
    assert!(matches("execution(foo.Bar.new(int))", &ctor));
    assert!(!matches("execution(foo.Bar.new())", &ctor));
    assert!(
        !matches("execution(* foo.Bar.*(..))", &ctor),
        "a method pattern must not match a constructor"
    );
}

#[test]
fn join_point_kind_gates_execution_and_call() {
    let element = baz_method();
    let expr = compile_ok("execution(* foo.Bar.*(..))");
    let call_expr = compile_ok("call(* foo.Bar.*(..))");

    let execution_ctx = MatchContext::new(&element);
    assert_eq!(expr.matches(&execution_ctx), Ok(true));
    assert_eq!(call_expr.matches(&execution_ctx), Ok(false));

    let call_ctx = MatchContext::new(&element).with_join_point(JoinPointKind::Call);
    assert_eq!(expr.matches(&call_ctx), Ok(false));
    assert_eq!(call_expr.matches(&call_ctx), Ok(true));
}

fn counter_field() -> ElementDescriptor {
    ElementDescriptor::new(ElementKind::Field, "counter", TypeDescriptor::new("foo.Bar"))
        .with_modifiers(Modifiers::PRIVATE)
        .with_return_type("int")
}

#[test]
fn field_access_gating_and_matching() {
    let field = counter_field();
    let get = compile_ok("get(int foo.Bar.counter)");
    let set = compile_ok("set(int foo.Bar.counter)");

    let read_ctx = MatchContext::new(&field);
    assert_eq!(get.matches(&read_ctx), Ok(true));
    assert_eq!(set.matches(&read_ctx), Ok(false));

    let write_ctx = MatchContext::new(&field).with_join_point(JoinPointKind::Set);
    assert_eq!(get.matches(&write_ctx), Ok(false));
    assert_eq!(set.matches(&write_ctx), Ok(true));

    assert!(!matches("get(long foo.Bar.counter)", &field));
    assert!(!matches("get(int foo.Bar.total)", &field));
}

#[rstest]
#[case("args(int, java.lang.String)", true)]
#[case("args(..)", true)]
#[case("args(int, ..)", true)]
#[case("args(.., java.lang.String)", true)]
#[case("args(.., int, ..)", true)]
#[case("args(int)", false)]
#[case("args(long, ..)", false)]
fn args_match_method_parameters(#[case] text: &str, #[case] expected: bool) {
    assert_eq!(matches(text, &baz_method()), expected, "`{text}`");
}

#[test]
fn args_cover_field_and_handler_join_points() {
    assert!(matches("args(int)", &counter_field()));
    assert!(!matches("args(long)", &counter_field()));

    let io_exception =
        TypeDescriptor::new("java.io.IOException").with_ancestors(["java.lang.Exception"]);
    let handler = ElementDescriptor::new(ElementKind::Handler, "", io_exception);
    assert!(matches("args(java.io.IOException)", &handler));
    assert!(!matches("args(java.lang.RuntimeException)", &handler));
}

#[test]
fn handler_matches_the_exception_hierarchy() {
    let io_exception = TypeDescriptor::new("java.io.IOException")
        .with_ancestors(["java.lang.Exception", "java.lang.Throwable"]);
    let handler = ElementDescriptor::new(ElementKind::Handler, "", io_exception);
    assert!(matches("handler(java.io.IOException)", &handler));
    assert!(matches("handler(java.lang.Throwable+)", &handler));
    assert!(!matches("handler(java.lang.RuntimeException)", &handler));
    assert!(
        !matches("handler(java.io.IOException)", &baz_method()),
        "non-handler join points never match handler()"
    );
}

#[test]
fn within_tests_the_lexically_enclosing_type() {
    assert!(matches("within(foo.Bar)", &baz_method()));
    assert!(matches("within(foo..*)", &baz_method()));
    assert!(!matches("within(bar..*)", &baz_method()));

    // A nested join point is "within" its enclosing member's type.
    let call_site = baz_method().with_enclosing(ElementDescriptor::new(
        ElementKind::Method,
        "handle",
        TypeDescriptor::new("foo.web.Controller"),
    ));
    assert!(matches("within(foo.web.Controller)", &call_site));
    assert!(!matches("within(foo.Bar)", &call_site));
}

#[test]
fn withincode_tests_the_enclosing_member() {
    let call_site = baz_method().with_enclosing(
        ElementDescriptor::new(
            ElementKind::Method,
            "handle",
            TypeDescriptor::new("foo.web.Controller"),
        )
        .with_return_type("void"),
    );
    assert!(matches("withincode(* foo.web.Controller.handle(..))", &call_site));
    assert!(!matches("withincode(* foo.web.Controller.render(..))", &call_site));
    assert!(
        !matches("withincode(* foo.web.Controller.handle(..))", &baz_method()),
        "a join point without an enclosing member is inside no code"
    );
}

#[test]
fn withincode_staticinitialization_form() {
    let clinit_site = baz_method().with_enclosing(ElementDescriptor::new(
        ElementKind::StaticInitializer,
        "",
        TypeDescriptor::new("foo.Bootstrap"),
    ));
    assert!(matches(
        "withincode(staticinitialization(foo.Bootstrap))",
        &clinit_site
    ));
    assert!(!matches(
        "withincode(staticinitialization(foo.Other))",
        &clinit_site
    ));
}

#[test]
fn staticinitialization_matches_the_initializing_type() {
    let clinit = ElementDescriptor::new(
        ElementKind::StaticInitializer,
        "",
        TypeDescriptor::new("foo.Bootstrap"),
    );
    assert!(matches("staticinitialization(foo.Bootstrap)", &clinit));
    assert!(matches("staticinitialization(foo..*)", &clinit));
    assert!(!matches("staticinitialization(foo.Bootstrap)", &baz_method()));
}

#[test]
fn cflow_includes_the_top_frame_and_cflowbelow_excludes_it() {
    let element = baz_method();
    let top = baz_method();
    let outer = ElementDescriptor::new(
        ElementKind::Method,
        "handle",
        TypeDescriptor::new("foo.web.Controller"),
    )
    .with_return_type("void");
    let stack = vec![top, outer];

    let in_baz = compile_ok("cflow(execution(* foo.Bar.baz(..)))");
    let below_baz = compile_ok("cflowbelow(execution(* foo.Bar.baz(..)))");
    let in_handle = compile_ok("cflowbelow(execution(* foo.web.Controller.handle(..)))");

    let ctx = MatchContext::new(&element).with_cflow(&stack);
    assert_eq!(in_baz.matches(&ctx), Ok(true));
    assert_eq!(below_baz.matches(&ctx), Ok(false), "only the top frame is baz");
    assert_eq!(in_handle.matches(&ctx), Ok(true));

    let empty_ctx = MatchContext::new(&element);
    assert_eq!(in_baz.matches(&empty_ctx), Ok(false));
}

#[test]
fn target_is_an_is_a_test_and_false_for_statics() {
    let element = dog_method("bark");
    assert!(matches("target(Animal)", &element));
    assert!(matches("target(Dog)", &element));
    assert!(!matches("target(Plant)", &element));

    let static_element = dog_method("create").with_modifiers(Modifiers::STATIC);
    assert!(!matches("target(Animal)", &static_element));
}

#[test]
fn this_tests_the_enclosing_instance() {
    let call_site = baz_method().with_enclosing(ElementDescriptor::new(
        ElementKind::Method,
        "handle",
        TypeDescriptor::new("foo.web.Controller"),
    ));
    assert!(matches("this(foo.web.Controller)", &call_site));
    assert!(!matches("this(foo.Bar)", &call_site));

    let static_caller = baz_method().with_enclosing(
        ElementDescriptor::new(
            ElementKind::Method,
            "main",
            TypeDescriptor::new("foo.web.Controller"),
        )
        .with_modifiers(Modifiers::STATIC),
    );
    assert!(!matches("this(foo.web.Controller)", &static_caller));
}

#[test]
fn modifier_filters_honour_negation() {
    let element = baz_method();
    assert!(matches("execution(public * foo.Bar.*(..))", &element));
    assert!(!matches("execution(private * foo.Bar.*(..))", &element));
    assert!(!matches("execution(!public * foo.Bar.*(..))", &element));
    assert!(matches("execution(!static * foo.Bar.*(..))", &element));
}

#[test]
fn annotation_only_member_pointcuts_accept_constructors() {
    let ctor =
        ElementDescriptor::new(ElementKind::Constructor, "new", TypeDescriptor::new("foo.Bar"))
            .with_annotation("Tx");
    assert!(matches("execution(@Tx)", &ctor));
    assert!(!matches("execution(@Audited)", &ctor));

    let call_expr = compile_ok("call(@Tx)");
    let call_ctx = MatchContext::new(&ctor).with_join_point(JoinPointKind::Call);
    assert_eq!(call_expr.matches(&call_ctx), Ok(true));

    // Join points nested inside an annotated constructor body.
    let site = baz_method().with_enclosing(ctor);
    assert!(matches("withincode(@Tx)", &site));
    assert!(!matches("withincode(@Audited)", &site));
}

#[test]
fn annotation_only_member_pointcuts_still_accept_methods() {
    let method = baz_method().with_annotation("Tx");
    assert!(matches("execution(@Tx)", &method));
    assert!(
        !matches("execution(@Tx)", &counter_field()),
        "field join points are neither methods nor constructors"
    );
}

#[test]
fn class_level_annotation_filters_apply_at_match_time() {
    let entity = TypeDescriptor::new("foo.model.Order")
        .with_annotation("javax.persistence.Entity")
        .with_modifiers(Modifiers::PUBLIC);
    let method = ElementDescriptor::new(ElementKind::Method, "total", entity.clone())
        .with_return_type("long");
    assert!(matches("within(@javax.persistence.Entity foo..*)", &method));
    assert!(!matches("within(@javax.persistence.Embeddable foo..*)", &method));
    assert!(!matches("within(!@javax.persistence.Entity foo..*)", &method));
    assert!(matches("within(public foo..*)", &method));
    assert!(!matches("within(final foo..*)", &method));

    let clinit = ElementDescriptor::new(ElementKind::StaticInitializer, "", entity);
    assert!(matches("staticinitialization(@javax.persistence.Entity foo..*)", &clinit));
    assert!(!matches("staticinitialization(@javax.persistence.Embeddable foo..*)", &clinit));
}

#[test]
fn field_pointcut_filters_apply_at_match_time() {
    let audited = counter_field().with_annotation("Audited");
    assert!(matches("get(@Audited int foo.Bar.counter)", &audited));
    assert!(!matches("get(!@Audited int foo.Bar.counter)", &audited));
    assert!(matches("get(private int foo.Bar.counter)", &audited));
    assert!(!matches("get(transient int foo.Bar.counter)", &audited));

    let plain = counter_field();
    assert!(!matches("get(@Audited int foo.Bar.counter)", &plain));
    assert!(matches("get(!@Audited int foo.Bar.counter)", &plain));
}

#[test]
fn annotation_filters_compare_qualified_names() {
    let element = baz_method().with_annotation("javax.transaction.Transactional");
    assert!(matches("execution(@javax.transaction.Transactional)", &element));
    assert!(!matches("execution(@javax.transaction.Tx)", &element));
    assert!(!matches("execution(!@javax.transaction.Transactional)", &element));
    assert!(matches("execution(!@javax.ejb.Remove)", &element));
}

#[test]
fn hasmethod_and_hasfield_enumerate_declared_members() {
    let ty = TypeDescriptor::new("foo.Repository")
        .with_method(
            MemberDescriptor::new("save")
                .with_modifiers(Modifiers::PUBLIC)
                .with_value_type("void")
                .with_parameter_types(["foo.Entity"]),
        )
        .with_field(
            MemberDescriptor::new("cacheSize")
                .with_modifiers(Modifiers::PRIVATE)
                .with_value_type("int"),
        );
    let element = ElementDescriptor::new(ElementKind::Type, "foo.Repository", ty);

    assert!(matches("hasmethod(* save(..))", &element));
    assert!(matches("hasmethod(public void save(foo.Entity))", &element));
    assert!(!matches("hasmethod(* delete(..))", &element));
    assert!(matches("hasfield(int cache*)", &element));
    assert!(!matches("hasfield(long cache*)", &element));
}

#[test]
fn array_parameter_types_compare_dimensions() {
    let element =
        ElementDescriptor::new(ElementKind::Method, "main", TypeDescriptor::new("foo.Main"))
            .with_modifiers(Modifiers::PUBLIC | Modifiers::STATIC)
            .with_return_type("void")
            .with_parameter_types(["java.lang.String[]"]);
    assert!(matches("execution(* foo.Main.main(java.lang.String[]))", &element));
    assert!(!matches("execution(* foo.Main.main(java.lang.String))", &element));
    assert!(matches("execution(* foo.Main.main(..))", &element));
}

#[test]
fn if_marker_always_matches_within_the_engine() {
    assert!(matches("if()", &baz_method()));
    assert!(matches("if() && execution(* foo.Bar.*(..))", &baz_method()));
}
