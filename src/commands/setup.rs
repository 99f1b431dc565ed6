use crate::*;
use crate::services::config_store::{self, normalize_root};
use crate::services::path_resolver::RootLayout;

fn summarize(doc: &ConfigDocument, key: &str) -> Result<RootSummary, GraftError> {
    let root = config_store::root(doc, key)?;
    Ok(RootSummary {
        has_token: root.reporter_token.is_some(),
        root: root.root_path,
        project_name: root.project_name,
        relative_imports: root.relative_imports,
        reporter_filepath: root.reporter_filepath,
    })
}

fn render_summary(s: &RootSummary) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}",
        s.root,
        s.project_name,
        if s.relative_imports { "relative" } else { "absolute" },
        if s.has_token { "token" } else { "no-token" },
        s.reporter_filepath.as_deref().unwrap_or("-")
    )
}

/// The repository root has no useful last path segment, so it is named
/// after the repository directory unless a name is already recorded.
fn default_name(ctx: &Context, doc: &ConfigDocument, key: &str) -> Option<String> {
    let recorded = doc.roots.get(key).and_then(|e| e.project_name.as_ref());
    (key == "." && recorded.is_none()).then(|| ctx.repository_name())
}

pub fn handle_setup_commands(cli: &Cli, ctx: &Context) -> anyhow::Result<bool> {
    match &cli.command {
        Commands::Init => {
            config_store::initialize(&ctx.config_file)?;
            let data = serde_json::json!({ "config": ctx.config_file });
            print_one(ctx.json, data, |_| {
                format!(
                    "initialized {}\nnext: graft token <ROOT> <TOKEN>, then graft add-reporter <ROOT>",
                    ctx.config_file.display()
                )
            })?;
        }
        Commands::Register {
            root,
            project_name,
            relative_imports,
        } => {
            let key = normalize_root(&ctx.repository, root)?;
            RootLayout::discover(&ctx.repository, &key)?;
            let mut doc = config_store::load(&ctx.config_file)?;
            let name = project_name
                .clone()
                .or_else(|| default_name(ctx, &doc, &key));
            config_store::register_root(&mut doc, &key, name.as_deref(), *relative_imports);
            config_store::save(&ctx.config_file, &doc)?;
            print_one(ctx.json, summarize(&doc, &key)?, render_summary)?;
        }
        Commands::Token { root, token } => {
            let key = normalize_root(&ctx.repository, root)?;
            if token.trim().is_empty() {
                return Err(GraftError::MissingToken(key).into());
            }
            let mut doc = config_store::load(&ctx.config_file)?;
            if !doc.roots.contains_key(&key) {
                RootLayout::discover(&ctx.repository, &key)?;
                let name = default_name(ctx, &doc, &key);
                config_store::register_root(&mut doc, &key, name.as_deref(), false);
            }
            config_store::set_reporter_token(&mut doc, &key, token.trim());
            config_store::save(&ctx.config_file, &doc)?;
            print_one(ctx.json, summarize(&doc, &key)?, render_summary)?;
        }
        Commands::Validate => {
            let doc = config_store::load(&ctx.config_file)?;
            let report = config_store::validate(&doc);
            let ok = report.is_valid();
            print_report(ctx.json, ok, &report, |r| {
                let mut lines: Vec<String> = r
                    .errors
                    .iter()
                    .map(|e| format!("error: {}", e))
                    .chain(r.warnings.iter().map(|w| format!("warning: {}", w)))
                    .collect();
                if lines.is_empty() {
                    lines.push(format!("{} is valid", ctx.config_file.display()));
                }
                lines.join("\n")
            })?;
            if !ok {
                std::process::exit(1);
            }
        }
        Commands::Show => {
            let doc = config_store::load_valid(&ctx.config_file)?;
            let summaries = doc
                .roots
                .keys()
                .map(|k| summarize(&doc, k))
                .collect::<Result<Vec<_>, _>>()?;
            print_out(ctx.json, &summaries, render_summary)?;
        }
        _ => return Ok(false),
    }

    Ok(true)
}
