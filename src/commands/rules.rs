use crate::config::{CONFIG_FILE, GateConfig};
use crate::rules::Severity;
use crate::rules::tables::RULE_CATALOG;
use colored::Colorize;
use std::path::Path;

pub fn handle_rules_command(project_root: &Path) -> i32 {
    let config = match GateConfig::load(project_root) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            return 2;
        }
    };
    let has_file = project_root.join(CONFIG_FILE).is_file();

    println!("\n{}", "Gate rules:".bold());
    let mut analyzer = "";
    for r in RULE_CATALOG {
        if r.analyzer != analyzer {
            analyzer = r.analyzer;
            println!("\n  {}", analyzer.cyan());
        }
        let level = match r.severity {
            Severity::Error => "[ERROR]".red(),
            Severity::Warning => "[WARNING]".yellow(),
        };
        println!("  {:<28} {:<12} {}", r.id.yellow(), level, r.description);
    }

    let t = &config.thresholds;
    println!();
    if has_file {
        println!("   Info: thresholds loaded from {}:", CONFIG_FILE);
    } else {
        println!("   Info: no {} found. Using defaults:", CONFIG_FILE);
    }
    println!("   [thresholds]");
    println!("   max_section_children = {}", t.max_section_children);
    println!("   max_component_depth = {}", t.max_component_depth);
    println!("   max_function_nesting = {}", t.max_function_nesting);
    println!("   max_prop_drilling = {}", t.max_prop_drilling);
    println!("   max_container_variants = {}", t.max_container_variants);
    println!("   max_spacing_variants = {}", t.max_spacing_variants);
    println!("   max_grid_cols = {}", t.max_grid_cols);
    println!("   max_font_sizes = {}", t.max_font_sizes);
    println!("   body_text_max_rank = {}", t.body_text_max_rank);
    println!("   max_import_depth = {}", t.max_import_depth);
    println!("   max_import_fan_in = {}", t.max_import_fan_in);
    0
}
