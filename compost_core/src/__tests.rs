use std::path::Path;

use rstest::rstest;
use similar_asserts::assert_eq;
use tracing_test::traced_test;

use super::*;
use crate::lexer::tokenize;
use crate::scanner::find_keyword;

fn write(path: &Path, content: &str) {
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("mkdir: {e}"));
	}
	std::fs::write(path, content).unwrap_or_else(|e| panic!("write: {e}"));
}

fn read(path: &Path) -> String {
	std::fs::read_to_string(path).unwrap_or_else(|e| panic!("read: {e}"))
}

fn component(tag: &str, directive: &str, body: &str) -> String {
	let class_name = class_name_for_tag(tag);
	format!("class {class_name} {{\n\t// <{tag}{directive} />\n\n{body}\n}}\n")
}

/// Undo the escaping applied to literal markup text.
fn template_value(rendered: &str) -> String {
	let body = rendered
		.strip_prefix("renderCompostHTML(`")
		.and_then(|rest| rest.strip_suffix("`)"))
		.unwrap_or_else(|| panic!("not a render call: {rendered}"));

	let mut value = String::new();
	let mut chars = body.chars();
	while let Some(ch) = chars.next() {
		if ch == '\\' {
			value.extend(chars.next());
		} else {
			value.push(ch);
		}
	}

	value
}

// --- Lexer ---

#[rstest]
#[case::code("const a = { b: 'c' };")]
#[case::markup("<div class=\"x\">{/* note */}${a}</div>\n")]
#[case::unicode("// ünïcødé `tick` \\ <br/>")]
fn tokens_cover_every_byte(#[case] source: &str) {
	let joined: String = tokenize(source)
		.iter()
		.map(|token| token.text(source))
		.collect();

	assert_eq!(joined, source);
}

// --- Markup rewriter ---

#[test]
fn rewrites_block_with_interpolation() {
	let output = rewrite_markup("const el = <div>{attr}</div>;");
	insta::assert_snapshot!(output, @"const el = renderCompostHTML(`<div>${attr}</div>`);");
}

#[test]
fn nested_blocks_return_to_depth_zero() {
	let source = "<ul><li>a</li><li><b>b</b></li></ul> tail";
	let segments = scan_markup(source);

	assert_eq!(segments.len(), 2);
	let Segment::Markup(block) = &segments[0] else {
		panic!("expected a markup block first: {segments:?}");
	};
	assert_eq!(block.root, "ul");
	assert_eq!(block.markup, "<ul><li>a</li><li><b>b</b></li></ul>");
	assert_eq!(segments[1], Segment::Code(block.span.end..source.len()));
}

#[test]
fn stray_closing_tag_is_plain_text() {
	let output = rewrite_markup("a = </p>; b = <i>x</i>;");
	assert_eq!(output, "a = </p>; b = renderCompostHTML(`<i>x</i>`);");
}

#[test]
fn consecutive_blocks_are_rewritten_separately() {
	let output = rewrite_markup("a(<p>1</p>, <p>2</p>);");
	assert_eq!(
		output,
		"a(renderCompostHTML(`<p>1</p>`), renderCompostHTML(`<p>2</p>`));"
	);
}

#[rstest]
#[case::nested(
	"x = <div><foo-bar a=\"1\"/></div>;",
	"x = renderCompostHTML(`<div><foo-bar a=\"1\"></foo-bar></div>`);"
)]
#[case::root("x = <foo-bar/>;", "x = renderCompostHTML(`<foo-bar></foo-bar>`);")]
#[case::spaced(
	"x = <p><my-item id=\"2\" /></p>;",
	"x = renderCompostHTML(`<p><my-item id=\"2\"></my-item></p>`);"
)]
fn self_closing_custom_tags_are_expanded(
	#[case] source: &str,
	#[case] expected: &str,
) {
	assert_eq!(rewrite_markup(source), expected);
}

#[test]
fn void_elements_do_not_change_depth() {
	let output = rewrite_markup("x = <div><br><img src=\"a.png\"><hr/></div>;");
	assert_eq!(
		output,
		"x = renderCompostHTML(`<div><br><img src=\"a.png\"><hr/></div>`);"
	);
}

#[test]
fn standalone_root_closes_immediately() {
	let output = rewrite_markup("x = <br/>;");
	insta::assert_snapshot!(output, @"x = renderCompostHTML(`<br/>`);");
}

#[test]
fn markup_in_comments_and_strings_is_untouched() {
	let source = "// <div>\nconst s = \"<p>\";\nconst q = '<i>';\nconst t = `<b>`;\n/* <i>\n</i> */\nconst u = `${ <b>x</b> }`;\n";
	assert_eq!(rewrite_markup(source), source);
}

#[test]
fn comparisons_are_not_tags() {
	let source = "for (let i = 0; i < n; i++) { if (a < b && c > d) {} }";
	assert_eq!(rewrite_markup(source), source);
}

#[test]
fn escaped_quotes_do_not_end_strings() {
	let source = "const s = \"a \\\" <p>\";\nconst x = <p>ok</p>;";
	assert_eq!(
		rewrite_markup(source),
		"const s = \"a \\\" <p>\";\nconst x = renderCompostHTML(`<p>ok</p>`);"
	);
}

#[test]
fn apostrophes_inside_markup_do_not_open_strings() {
	let output = rewrite_markup("x = <p>don't stop</p>; y = <b>1</b>;");
	assert_eq!(
		output,
		"x = renderCompostHTML(`<p>don't stop</p>`); y = renderCompostHTML(`<b>1</b>`);"
	);
}

#[rstest]
#[case::plain("<p>Hello world</p>")]
#[case::attributes("<a href=\"/x\" class='y'>link</a>")]
#[case::backticks("<pre>a `tick` here</pre>")]
#[case::backslash("<pre>C:\\path\\to</pre>")]
#[case::dollar("<p>costs $5</p>")]
#[case::multiline("<ul>\n\t<li>one</li>\n\t<li>two</li>\n</ul>")]
fn literal_markup_round_trips(#[case] markup: &str) {
	let rewritten = rewrite_markup(markup);
	assert_eq!(template_value(&rewritten), markup);
}

#[rstest]
#[case::comment("<div>{/* note */}</div>", "<div><!-- note --></div>")]
#[case::every_comment("<div>{/* a */}<p>{/* b */}</p></div>", "<div><!-- a --><p><!-- b --></p></div>")]
#[case::nested_braces(
	"<p>{items.map((i) => { return i; })}</p>",
	"<p>${items.map((i) => { return i; })}</p>"
)]
#[case::literal_dollar("<span>${price}</span>", "<span>$${price}</span>")]
#[case::quoted_brace("<p>{a ? \"{\" : b} `q`</p>", "<p>${a ? \"{\" : b} \\`q\\`</p>")]
#[case::quoted_close("<p>{f('}')}</p>", "<p>${f('}')}</p>")]
#[case::object_literal("<p>{fmt({ a: 1 })}</p>", "<p>${fmt({ a: 1 })}</p>")]
#[case::escapes_literal_text("<p>`{a}`</p>", "<p>\\`${a}\\`</p>")]
fn transforms_markup_text(#[case] markup: &str, #[case] expected: &str) {
	assert_eq!(transform_markup(markup), expected);
}

#[test]
fn self_render_tag_assigns_inner_markup() {
	let output = rewrite_markup("created() {\n\t<This><p>{name}</p></This>\n}");
	assert_eq!(output, "created() {\n\tthis.innerHTML = `<p>${name}</p>`\n}");
}

#[test]
fn empty_self_render_block() {
	insta::assert_snapshot!(rewrite_markup("<This></This>;"), @"this.innerHTML = ``;");
}

#[test]
fn self_render_tag_is_configurable() {
	let options = RewriteOptions {
		self_render_tag: "Self".to_string(),
	};
	let output = rewrite_markup_with_options("<Self><b>x</b></Self> <This>y</This>", &options);
	assert_eq!(
		output,
		"this.innerHTML = `<b>x</b>` renderCompostHTML(`<This>y</This>`)"
	);
}

#[test]
fn self_render_tag_only_applies_at_the_root() {
	let output = rewrite_markup("x = <div><This>a</This></div>;");
	assert_eq!(output, "x = renderCompostHTML(`<div><This>a</This></div>`);");
}

#[traced_test]
#[test]
fn unclosed_region_is_left_as_code() {
	let source = "const x = <div>\n\t<p>never closed</p>\n";
	assert_eq!(rewrite_markup(source), source);
	assert!(logs_contain("markup block never closes"));
}

#[test]
fn comparison_before_arrow_does_not_swallow_later_markup() {
	let source = "for (let i = 0; i<n; i++) xs.forEach(x => f(x));\ny = <b>{n}</b>;";
	assert_eq!(
		rewrite_markup(source),
		"for (let i = 0; i<n; i++) xs.forEach(x => f(x));\ny = renderCompostHTML(`<b>${n}</b>`);"
	);
}

// --- Span extractor ---

#[test]
fn finds_first_class_keyword_in_code() {
	let source = "// class X\nconst s = 'class';\nconst classy = 1;\nclass Real {}\n";
	let expected = source.find("class Real");

	assert_eq!(find_class_keyword(source), expected);
}

#[test]
fn body_span_ignores_braces_in_strings_and_comments() -> CompostResult<()> {
	let source = "class A {\n\tm() { const s = \"}\"; const t = '{'; /* } */ // }\n\t}\n}\ntrailing();\n";
	let end = source
		.find("}\ntrailing")
		.unwrap_or_else(|| panic!("fixture"))
		+ 1;

	assert_eq!(extract_body_span(source, 0)?, 0..end);

	Ok(())
}

#[test]
fn body_span_ignores_braces_in_template_literals() -> CompostResult<()> {
	let source = "class A { m() { return `}${ { a: 1 }.a }{`; } } after";
	let end = source.rfind('}').unwrap_or_else(|| panic!("fixture")) + 1;

	assert_eq!(extract_body_span(source, 0)?, 0..end);

	Ok(())
}

#[test]
fn unbalanced_body_is_an_error() {
	let result = extract_body_span("const a = 1;\nclass A {\n\tm() {\n}\n", 13);

	match result {
		Err(CompostError::UnbalancedBody { line, column, .. }) => {
			assert_eq!((line, column), (2, 1));
		}
		other => panic!("expected UnbalancedBody, got {other:?}"),
	}
}

#[test]
fn property_access_is_not_a_keyword() {
	let source = "x.constructor; constructor()";
	let tokens = tokenize(source);

	assert_eq!(
		find_keyword(source, &tokens, "constructor", 0..source.len()),
		Some(15)
	);
}

// --- Directive parser ---

#[rstest]
#[case::class_toggle(".on", "on", AttributeKind::ClassToggle, false)]
#[case::boolean("flag?", "flag", AttributeKind::Boolean, false)]
#[case::required("attr!", "attr", AttributeKind::Plain, true)]
#[case::plain("attr", "attr", AttributeKind::Plain, false)]
#[case::hyphen_class(".is-active", "is-active", AttributeKind::ClassToggle, false)]
#[case::hyphen_boolean("is-open?", "is-open", AttributeKind::Boolean, false)]
#[case::hyphen_required("data-id!", "data-id", AttributeKind::Plain, true)]
#[case::hyphen_plain("aria-label", "aria-label", AttributeKind::Plain, false)]
fn classifies_attribute_tokens(
	#[case] token: &str,
	#[case] name: &str,
	#[case] kind: AttributeKind,
	#[case] required: bool,
) {
	let attribute = classify_attribute(token).unwrap_or_else(|| panic!("`{token}` not classified"));

	assert_eq!(attribute.name, name);
	assert_eq!(attribute.kind, kind);
	assert_eq!(attribute.required, required);
	assert_eq!(attribute.member_name(), name.replace('-', "_"));
}

#[rstest]
#[case::empty("")]
#[case::only_marker("!")]
#[case::only_question("?")]
#[case::only_dot(".")]
#[case::invalid_chars("foo$")]
#[case::angle("<x")]
fn ignores_malformed_tokens(#[case] token: &str) {
	assert_eq!(classify_attribute(token), None);
}

#[test]
fn directive_must_name_the_tag_exactly() {
	assert!(parse_directive_comment(" <my-thing-extra />", "my-thing").is_none());
	assert!(parse_directive_comment(" <my-thing/>", "my-thing").is_some());
	assert!(parse_directive_comment(" <other-thing />", "my-thing").is_none());
}

#[test]
fn finds_directive_comment_within_range() {
	let source = "class A {\n\t/* // <a-b y /> */\n\t// <a-b x! .on />\n}\n";
	let directive = find_directive(source, "a-b", 0..source.len())
		.unwrap_or_else(|| panic!("directive not found"));

	assert_eq!(&source[directive.span.clone()], "// <a-b x! .on />");
	let names: Vec<&str> = directive.attributes.iter().map(|a| a.name.as_str()).collect();
	assert_eq!(names, vec!["x", "on"]);

	let before = source.find("// <a-b x").unwrap_or_else(|| panic!("fixture"));
	assert_eq!(find_directive(source, "a-b", 0..before), None);
}

#[traced_test]
#[test]
fn duplicate_attributes_keep_the_first() {
	let (attributes, _) = parse_directive_comment(" <x-y a! a? .b />", "x-y")
		.unwrap_or_else(|| panic!("directive not found"));

	assert_eq!(attributes.len(), 2);
	assert_eq!(attributes[0].kind, AttributeKind::Plain);
	assert!(attributes[0].required);
	assert!(logs_contain("duplicate attribute in directive ignored"));
}

#[test]
fn parses_component_descriptor() -> CompostResult<()> {
	let source = component("my-thing", " attr! flag? .on", "\tcreated() {}");
	let descriptor = parse_component("my-thing", &source)?;

	assert_eq!(descriptor.tag_name, "my-thing");
	assert_eq!(descriptor.class_name, "MyThing");
	assert_eq!(descriptor.body, 0..source.trim_end().len());
	assert_eq!(
		&source[descriptor.directive.clone()],
		"// <my-thing attr! flag? .on />"
	);
	assert_eq!(descriptor.required_attributes(), vec!["attr"]);
	assert!(!descriptor.has_constructor);
	assert!(!descriptor.has_extends);

	Ok(())
}

#[test]
fn directive_in_a_string_is_not_found() {
	let source = "class A {\n\tm() { return \"// <a-b />\"; }\n}\n";
	let result = parse_component("a-b", source);

	assert!(matches!(result, Err(CompostError::MissingDirective { .. })));
}

#[test]
fn missing_class_is_an_error() {
	let result = parse_component("a-b", "// <a-b />\nconst x = 1;\n");
	assert!(matches!(result, Err(CompostError::MissingClass { .. })));
}

#[test]
fn detects_constructor_and_extends() -> CompostResult<()> {
	let source = "class A extends HTMLElement {\n\t// <a-b />\n\tconstructor() { super(); }\n}\n";
	let descriptor = parse_component("a-b", source)?;
	assert!(descriptor.has_constructor);
	assert!(descriptor.has_extends);

	let source = "class A {\n\t// <a-b />\n\tname() { return this.constructor.name; }\n}\n";
	let descriptor = parse_component("a-b", source)?;
	assert!(!descriptor.has_constructor);

	Ok(())
}

// --- Code generator ---

#[test]
fn compiles_end_to_end_component() -> CompostResult<()> {
	let source = "class MyThing {\n\t// <my-thing attr! flag? .on />\n\n\tcreated() {\n\t\tthis.appendChild(<div>{attr}</div>);\n\t}\n}\n";
	let compiled = compile_source("my-thing", source, &RewriteOptions::default())?;

	let expected = "class MyThing extends CompostComponent {\n\
	                \tconstructor(attr) { super(attr); }\n\
	                \n\
	                \tcreated() {\n\
	                \t\tthis.appendChild(renderCompostHTML(`<div>${attr}</div>`));\n\
	                \t}\n\
	                \n\
	                \tget requiredAttributes() {\n\
	                \t\treturn [\"attr\"];\n\
	                \t}\n\
	                \n\
	                \tget attr() {\n\
	                \t\treturn this.getAttribute('attr');\n\
	                \t}\n\
	                \n\
	                \tset attr(val) {\n\
	                \t\tthis.setAttribute('attr', val);\n\
	                \t}\n\
	                \n\
	                \tget flag() {\n\
	                \t\treturn this.hasAttribute('flag');\n\
	                \t}\n\
	                \n\
	                \tset flag(val) {\n\
	                \t\tthis.toggleAttribute('flag', val);\n\
	                \t}\n\
	                \n\
	                \tget on() {\n\
	                \t\treturn this.classList.contains('on');\n\
	                \t}\n\
	                \n\
	                \tset on(val) {\n\
	                \t\tthis.classList.toggle('on', val);\n\
	                \t}\n\
	                }\n\
	                \n\
	                customElements.define('my-thing', MyThing);\n";

	assert_eq!(compiled, expected);

	Ok(())
}

#[test]
fn hyphenated_attributes_use_underscored_members() -> CompostResult<()> {
	let source = component("x-y", " data-id! is-open? .is-active", "");
	let compiled = compile_source("x-y", &source, &RewriteOptions::default())?;

	assert!(compiled.contains("get data_id() {\n\t\treturn this.getAttribute('data-id');"));
	assert!(compiled.contains("set is_open(val) {\n\t\tthis.toggleAttribute('is-open', val);"));
	assert!(compiled.contains("get is_active() {\n\t\treturn this.classList.contains('is-active');"));
	assert!(compiled.contains("return [\"data-id\"];"));

	Ok(())
}

#[test]
fn explicit_constructor_removes_directive() -> CompostResult<()> {
	let source = "class A extends Base {\n\t// <a-b x />\n\tconstructor(attr) { super(attr); this.n = 1; }\n}\n";
	let compiled = compile_source("a-b", source, &RewriteOptions::default())?;

	assert!(!compiled.contains("// <a-b"));
	assert!(!compiled.contains(FORWARDING_CONSTRUCTOR));
	assert!(!compiled.contains(BASE_CLASS));
	assert!(compiled.starts_with("class A extends Base {"));
	assert!(compiled.contains("return [];"));

	Ok(())
}

#[test]
fn surrounding_code_passes_through() -> CompostResult<()> {
	let source = "const helper = () => <span>h</span>;\n\nclass A {\n\t// <a-b />\n}\n\nclass Other {}\n";
	let compiled = compile_source("a-b", source, &RewriteOptions::default())?;

	assert!(compiled.starts_with("const helper = () => renderCompostHTML(`<span>h</span>`);\n\nclass A extends CompostComponent {"));
	assert!(compiled.contains("customElements.define('a-b', A);\n\nclass Other {}\n"));
	assert!(!compiled.contains("class Other extends"));

	Ok(())
}

#[test]
fn loop_comparison_in_a_method_still_compiles() -> CompostResult<()> {
	let source = "class MyThing {\n\t// <my-thing />\n\tcreated() { for (let i = 0; i<n; i++) xs.forEach(x => f(x)); }\n}\n";
	let compiled = compile_source("my-thing", source, &RewriteOptions::default())?;

	assert!(compiled.contains("created() { for (let i = 0; i<n; i++) xs.forEach(x => f(x)); }"));
	assert!(compiled.ends_with("customElements.define('my-thing', MyThing);\n"));

	Ok(())
}

#[test]
fn starter_template_compiles() -> CompostResult<()> {
	let source = component_template("my-card");
	let compiled = compile_source("my-card", &source, &RewriteOptions::default())?;

	assert!(compiled.contains("this.innerHTML = ``"));
	assert!(compiled.ends_with("customElements.define('my-card', MyCard);\n"));

	Ok(())
}

// --- Scaffolding ---

#[rstest]
#[case::two_words("my-thing", true)]
#[case::digits("my-thing2", true)]
#[case::many("x-fancy-card-3", true)]
#[case::double_hyphen("my--thing", true)]
#[case::single_word("thing", false)]
#[case::uppercase("My-thing", false)]
#[case::digit_first_word("my2-thing", false)]
#[case::trailing_hyphen("my-thing-", false)]
#[case::triple_hyphen("my---thing", false)]
#[case::empty_first("-thing", false)]
#[case::underscore("my_thing-x", false)]
fn validates_tag_names(#[case] tag: &str, #[case] valid: bool) {
	assert_eq!(is_valid_tag_name(tag), valid, "{tag}");
}

#[rstest]
#[case("my-thing", "MyThing")]
#[case("x-fancy-card-3", "XFancyCard3")]
#[case("my--thing", "MyThing")]
fn derives_class_names(#[case] tag: &str, #[case] class_name: &str) {
	assert_eq!(class_name_for_tag(tag), class_name);
}

#[test]
fn create_component_refuses_to_overwrite() -> CompostResult<()> {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	let config = CompostConfig::default();

	let path = create_component(tmp.path(), &config, "my-card")?;
	assert_eq!(path, tmp.path().join("components/my-card.jsx"));
	assert_eq!(read(&path), component_template("my-card"));

	let again = create_component(tmp.path(), &config, "my-card");
	assert!(matches!(again, Err(CompostError::ComponentExists(_))));

	let invalid = create_component(tmp.path(), &config, "card");
	assert!(matches!(invalid, Err(CompostError::InvalidTagName(_))));

	Ok(())
}

#[test]
fn init_project_is_idempotent() -> CompostResult<()> {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));

	let first = init_project(tmp.path(), Some(Path::new("web/parts")))?;
	assert_eq!(first.config_file, Some(tmp.path().join("compost.toml")));
	assert!(tmp.path().join("web/parts").is_dir());
	assert_eq!(read(&tmp.path().join("web/parts/compiled.js")), "");

	let config = CompostConfig::load_or_default(tmp.path())?;
	assert_eq!(config.components, Path::new("web/parts"));

	let second = init_project(tmp.path(), None)?;
	assert!(second.is_noop());

	Ok(())
}

// --- Configuration ---

#[test]
fn config_defaults_without_files() -> CompostResult<()> {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));

	assert!(CompostConfig::load(tmp.path())?.is_none());
	let config = CompostConfig::load_or_default(tmp.path())?;
	assert_eq!(config, CompostConfig::default());
	assert_eq!(config.watch.debounce_ms, 500);

	Ok(())
}

#[test]
fn config_reads_toml_candidates_in_order() -> CompostResult<()> {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	write(
		&tmp.path().join(".config/compost.toml"),
		"components = \"ignored\"\n",
	);
	write(
		&tmp.path().join("compost.toml"),
		"components = \"src/parts\"\non_error = \"skip\"\nexclude = [\"*.draft.jsx\"]\n\n[watch]\ndebounce_ms = 50\n",
	);

	let config = CompostConfig::load_or_default(tmp.path())?;
	assert_eq!(config.components, Path::new("src/parts"));
	assert_eq!(config.on_error, OnError::Skip);
	assert_eq!(config.exclude, vec!["*.draft.jsx".to_string()]);
	assert_eq!(config.watch.debounce_ms, 50);
	assert_eq!(config.extension, "jsx");

	Ok(())
}

#[test]
fn config_falls_back_to_package_json() -> CompostResult<()> {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	write(
		&tmp.path().join("package.json"),
		r#"{ "name": "site", "compost": { "components": "public/components", "output": "public/components/compiled.js" } }"#,
	);

	let config = CompostConfig::load_or_default(tmp.path())?;
	assert_eq!(config.components, Path::new("public/components"));
	assert_eq!(config.output, Path::new("public/components/compiled.js"));

	Ok(())
}

#[test]
fn invalid_config_is_a_parse_error() {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	write(&tmp.path().join("compost.toml"), "on_error = \"explode\"\n");

	let result = CompostConfig::load(tmp.path());
	assert!(matches!(result, Err(CompostError::ConfigParse(_))));
}

#[test]
fn invalid_exclude_pattern_is_reported() {
	let config = CompostConfig {
		exclude: vec!["[".to_string()],
		..CompostConfig::default()
	};

	assert!(matches!(
		config.exclude_set(),
		Err(CompostError::InvalidExclude { .. })
	));
}

// --- Build orchestrator ---

#[test]
fn build_writes_prelude_and_units_in_file_name_order() -> CompostResult<()> {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	let dir = tmp.path().join("components");
	write(&dir.join("b-two.jsx"), &component("b-two", "", ""));
	write(&dir.join("a-one.jsx"), &component("a-one", " label", ""));
	write(&dir.join("notes.txt"), "not a component");

	let report = build_project(tmp.path())?;
	assert!(report.is_ok());
	assert!(report.written);

	let tags: Vec<_> = report.units.iter().map(|unit| unit.tag.as_str()).collect();
	assert_eq!(tags, vec!["a-one", "b-two"]);

	let artifact = read(&dir.join("compiled.js"));
	assert_eq!(artifact, report.bundle);
	assert!(artifact.starts_with(PRELUDE));

	let first = artifact.find("// a-one.jsx").unwrap_or_else(|| panic!("a-one missing"));
	let second = artifact.find("// b-two.jsx").unwrap_or_else(|| panic!("b-two missing"));
	assert!(first < second);

	let rebuilt = build_project(tmp.path())?;
	assert_eq!(rebuilt.bundle, report.bundle);

	Ok(())
}

#[test]
fn missing_directive_aborts_without_touching_artifact() -> CompostResult<()> {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	let dir = tmp.path().join("components");
	write(&dir.join("compiled.js"), "previous build");
	write(&dir.join("good-one.jsx"), &component("good-one", "", ""));
	write(&dir.join("bad-one.jsx"), "class BadOne {\n\tcreated() {}\n}\n");

	let report = build_project(tmp.path())?;
	assert!(!report.is_ok());
	assert!(!report.written);
	assert_eq!(report.units.len(), 1);
	assert_eq!(report.total(), 2);
	assert_eq!(read(&dir.join("compiled.js")), "previous build");

	match &report.failures[0].error {
		CompostError::MissingDirective { tag, file } => {
			assert_eq!(tag, "bad-one");
			assert_eq!(file, "bad-one.jsx");
		}
		other => panic!("expected MissingDirective, got {other:?}"),
	}

	Ok(())
}

#[test]
fn skip_policy_writes_partial_bundle() -> CompostResult<()> {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	let dir = tmp.path().join("components");
	write(&tmp.path().join("compost.toml"), "on_error = \"skip\"\n");
	write(&dir.join("good-one.jsx"), &component("good-one", "", ""));
	write(&dir.join("bad-one.jsx"), "class BadOne {\n");

	let report = build_project(tmp.path())?;
	assert!(report.written);
	assert_eq!(report.failures.len(), 1);

	let artifact = read(&dir.join("compiled.js"));
	assert!(artifact.contains("customElements.define('good-one', GoodOne);"));
	assert!(!artifact.contains("bad-one"));

	Ok(())
}

#[test]
fn excluded_files_and_artifact_are_skipped() -> CompostResult<()> {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	let dir = tmp.path().join("components");
	write(
		&tmp.path().join("compost.toml"),
		"extension = \"js\"\nexclude = [\"*.draft.js\"]\n",
	);
	write(&dir.join("compiled.js"), "");
	write(&dir.join("x-card.js"), &component("x-card", "", ""));
	write(&dir.join("x-card.draft.js"), "not compiled");

	let report = build_project(tmp.path())?;
	assert!(report.is_ok());
	assert_eq!(report.units.len(), 1);
	assert_eq!(report.units[0].tag, "x-card");

	Ok(())
}

#[test]
fn missing_components_dir_is_fatal() {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	let result = build_project(tmp.path());

	assert!(matches!(result, Err(CompostError::MissingComponentsDir(_))));
}

#[test]
fn crlf_sources_are_normalized() -> CompostResult<()> {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	let dir = tmp.path().join("components");
	write(
		&dir.join("a-b.jsx"),
		"class AB {\r\n\t// <a-b x />\r\n\tcreated() { <This>hi</This> }\r\n}\r\n",
	);

	let report = build_project(tmp.path())?;
	assert!(report.is_ok());
	assert!(!report.bundle.contains('\r'));

	Ok(())
}

#[test]
fn check_detects_stale_artifact() -> CompostResult<()> {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	let dir = tmp.path().join("components");
	write(&dir.join("a-b.jsx"), &component("a-b", "", ""));

	assert!(check_project(tmp.path())?.is_stale());

	build_project(tmp.path())?;
	assert!(check_project(tmp.path())?.is_ok());

	write(&dir.join("a-b.jsx"), &component("a-b", " title", ""));
	let result = check_project(tmp.path())?;
	assert!(result.is_stale());
	assert!(result.current.is_some());

	Ok(())
}

#[traced_test]
#[test]
fn build_logs_state_transitions() -> CompostResult<()> {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	write(
		&tmp.path().join("components/a-b.jsx"),
		&component("a-b", "", ""),
	);

	build_project(tmp.path())?;
	assert!(logs_contain("to=scanning directory"));
	assert!(logs_contain("to=generate"));
	assert!(logs_contain("to=idle"));

	Ok(())
}
