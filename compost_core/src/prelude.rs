//! The runtime code placed at the top of every compiled bundle.

/// Defines the render helper used by rewritten markup blocks and the base
/// class every compiled component extends.
pub const PRELUDE: &str = r#"function renderCompostHTML(html) {
	const div = document.createElement('div');
	div.innerHTML = html;
	const elem = div.firstElementChild;
	elem.remove();
	return elem;
}

class CompostComponent extends HTMLElement {
	constructor(attr) {
		super();

		this.creation_complete = false;

		if (attr) {
			for (const key in attr) this.setAttribute(key.replaceAll('_', '-'), attr[key]);
		}
	}

	get requiredAttributes() {
		return [];
	}

	connectedCallback() {
		if (this.creation_complete) return;
		this.creation_complete = true;

		for (const name of this.requiredAttributes) {
			if (!this.hasAttribute(name)) {
				throw new Error(`Required attribute "${name}" not found`);
			}
		}

		if (typeof this.created === 'function') this.created();
	}
}
"#;

/// Header line written above each compiled unit so the bundle can be traced
/// back to its sources.
pub fn unit_header(file_name: &str) -> String {
	format!("// {file_name}")
}
