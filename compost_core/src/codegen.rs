use std::fmt::Write as _;

use crate::directive::AttributeDescriptor;
use crate::directive::AttributeKind;
use crate::directive::ComponentDescriptor;

/// The runtime base class every component extends unless it names its own.
pub const BASE_CLASS: &str = "CompostComponent";

/// Inserted in place of the directive when the class has no constructor.
pub const FORWARDING_CONSTRUCTOR: &str = "constructor(attr) { super(attr); }";

/// The getter/setter pair for a single attribute.
pub fn render_accessor(attribute: &AttributeDescriptor) -> String {
	let member = attribute.member_name();
	let name = &attribute.name;

	let (getter, setter) = match attribute.kind {
		AttributeKind::Plain => {
			(
				format!("this.getAttribute('{name}')"),
				format!("this.setAttribute('{name}', val)"),
			)
		}
		AttributeKind::Boolean => {
			(
				format!("this.hasAttribute('{name}')"),
				format!("this.toggleAttribute('{name}', val)"),
			)
		}
		AttributeKind::ClassToggle => {
			(
				format!("this.classList.contains('{name}')"),
				format!("this.classList.toggle('{name}', val)"),
			)
		}
	};

	format!(
		"\tget {member}() {{\n\t\treturn {getter};\n\t}}\n\n\tset {member}(val) {{\n\t\t{setter};\n\t}}"
	)
}

/// The `requiredAttributes` getter read by the runtime base class.
pub fn render_required_attributes(descriptor: &ComponentDescriptor) -> String {
	let required = serde_json::Value::from(descriptor.required_attributes());
	format!("\tget requiredAttributes() {{\n\t\treturn {required};\n\t}}")
}

/// The statement registering the class as a custom element.
pub fn render_registration(descriptor: &ComponentDescriptor) -> String {
	format!(
		"customElements.define('{}', {});",
		descriptor.tag_name, descriptor.class_name
	)
}

/// Emit the compiled class described by `descriptor` followed by its
/// registration statement.
///
/// `source` must be the text the descriptor was parsed from.
pub fn generate_class(source: &str, descriptor: &ComponentDescriptor) -> String {
	let body = &descriptor.body;
	let name_end = descriptor.name_span.end;
	let directive = &descriptor.directive;
	let mut output = String::with_capacity(body.len() * 2);

	output.push_str(&source[body.start..name_end]);
	if !descriptor.has_extends {
		let _ = write!(output, " extends {BASE_CLASS}");
	}

	output.push_str(&source[name_end..directive.start]);
	if !descriptor.has_constructor {
		output.push_str(FORWARDING_CONSTRUCTOR);
	}

	// Everything up to the closing brace, which is re-added after the
	// generated members.
	let rest = &source[directive.end..body.end - 1];
	output.push_str(rest.trim_end());
	output.push_str("\n\n");
	output.push_str(&render_required_attributes(descriptor));

	for attribute in &descriptor.attributes {
		output.push_str("\n\n");
		output.push_str(&render_accessor(attribute));
	}

	output.push_str("\n}\n\n");
	output.push_str(&render_registration(descriptor));

	output
}

/// Replace the component class inside `source` with its compiled form,
/// keeping any surrounding code as it is.
pub fn compile_component(source: &str, descriptor: &ComponentDescriptor) -> String {
	let body = &descriptor.body;
	let mut output = String::with_capacity(source.len() * 2);

	output.push_str(&source[..body.start]);
	output.push_str(&generate_class(source, descriptor));
	output.push_str(&source[body.end..]);

	output
}
