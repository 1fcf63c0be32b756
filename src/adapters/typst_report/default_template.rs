//! Built-in Typst report template.
//!
//! Placeholders are `{{NAME}}` markers resolved by [`super::resolve`].

const DEFAULT_TEMPLATE: &str = r#"#set page(paper: "a4", margin: 2cm)
#set text(size: 10pt)

= Portfolio Performance Report

{{PERIOD}}

== Key Metrics

{{METRICS_TABLE}}

== Portfolio Composition

{{COMPOSITION_TABLE}}

== Latest Market Changes

{{LATEST_CHANGES}}

== Monthly Returns

{{MONTHLY_RETURNS}}

== Alerts

{{ALERTS_TABLE}}
"#;

pub fn template() -> &'static str {
    DEFAULT_TEMPLATE
}
