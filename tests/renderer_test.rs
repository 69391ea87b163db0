use serde_json::json;
use stencil::renderer::{Dialect, MiniJinjaRenderer, TemplateRenderer};
use stencil::values::ValuesContext;

fn render(dialect: Dialect, template: &str, values: serde_json::Value) -> String {
    let values: ValuesContext = serde_json::from_value(values).unwrap();
    let renderer = MiniJinjaRenderer::new(dialect).unwrap();
    renderer.render(template, &dialect.context(&values)).unwrap()
}

#[test]
fn test_default_dialect_interpolation() {
    let result = render(Dialect::Default, "Hello ${{ values.name }}!", json!({"name": "test"}));
    assert_eq!(result, "Hello test!");

    let result = render(Dialect::Default, "Value: ${{ values.value }}", json!({"value": 42}));
    assert_eq!(result, "Value: 42");
}

#[test]
fn test_default_dialect_conditionals() {
    let template = r#"${{ "dummy" if not values.skip else "" }}"#;
    assert_eq!(render(Dialect::Default, template, json!({"skip": true})), "");
    assert_eq!(render(Dialect::Default, template, json!({"skip": false})), "dummy");
    assert_eq!(render(Dialect::Default, template, json!({})), "dummy");
}

#[test]
fn test_default_dialect_blocks_and_comments() {
    let template = "{# note #}{% for item in values.items %}${{ item }};{% endfor %}";
    assert_eq!(render(Dialect::Default, template, json!({"items": ["a", "b"]})), "a;b;");
}

#[test]
fn test_compat_dialect_interpolation() {
    let result = render(Dialect::Compat, "Hello {{ cookiecutter.name }}!", json!({"name": "test"}));
    assert_eq!(result, "Hello test!");
}

#[test]
fn test_json_filters_agree() {
    let values = json!({"meta": {"tags": ["x", 1]}});
    let default = render(Dialect::Default, "${{ values.meta | dump }}", values.clone());
    let compat = render(Dialect::Compat, "{{ cookiecutter.meta | jsonify }}", values.clone());
    let compat_dump = render(Dialect::Compat, "{{ cookiecutter.meta | dump }}", values);

    assert_eq!(default, r#"{"tags":["x",1]}"#);
    assert_eq!(default, compat);
    assert_eq!(default, compat_dump);
}

#[test]
fn test_repo_filters() {
    let values = json!({"repoUrl": "github.com?owner=acme&repo=payments"});
    assert_eq!(
        render(Dialect::Default, "${{ (values.repoUrl | parse_repo_url).owner }}", values.clone()),
        "acme"
    );
    assert_eq!(render(Dialect::Default, "${{ values.repoUrl | project_slug }}", values), "acme/payments");
}

#[test]
fn test_case_filters() {
    let values = json!({"name": "Payment Service"});
    assert_eq!(render(Dialect::Default, "${{ values.name | kebab_case }}", values.clone()), "payment-service");
    assert_eq!(render(Dialect::Default, "${{ values.name | snake_case }}", values), "payment_service");
}

#[test]
fn test_malformed_template_is_an_error() {
    let renderer = MiniJinjaRenderer::new(Dialect::Default).unwrap();
    assert!(renderer.render("${{ values.name ", &json!({})).is_err());
    assert!(renderer.render("{% if %}", &json!({})).is_err());
}
