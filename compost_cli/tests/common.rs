use std::path::Path;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub fn compost_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("compost"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("COMPOST_LOG");
	cmd
}

/// Write a minimal component for `tag` into `<root>/components`.
#[allow(dead_code)]
pub fn write_component(root: &Path, tag: &str, directive: &str, body: &str) -> std::io::Result<()> {
	let dir = root.join("components");
	std::fs::create_dir_all(&dir)?;
	let class_name = compost_core::class_name_for_tag(tag);
	std::fs::write(
		dir.join(format!("{tag}.jsx")),
		format!("class {class_name} {{\n\t// <{tag}{directive} />\n\n{body}\n}}\n"),
	)
}
