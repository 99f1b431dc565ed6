use crate::*;
use crate::services::inventory::list_system_reports;
use crate::services::orchestrator::{add_reporter, add_system_report};

fn render_patch(
    target: &std::path::Path,
    reference: &ModuleReference,
    patch: &PatchOutcome,
) -> String {
    match patch {
        PatchOutcome::Inserted { line } => format!(
            "activated {} in {} at line {}",
            reference,
            target.display(),
            line + 1
        ),
        PatchOutcome::AlreadyApplied { line } => format!(
            "{} already activated in {} at line {}",
            reference,
            target.display(),
            line + 1
        ),
    }
}

fn join_lines(lines: &[usize]) -> String {
    lines
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

pub fn handle_instrument_commands(cli: &Cli, ctx: &Context) -> anyhow::Result<bool> {
    match &cli.command {
        Commands::AddReporter {
            root,
            reporter_file,
        } => {
            let report = add_reporter(ctx, root, reporter_file.as_deref())?;
            print_one(ctx.json, report, |r| {
                format!(
                    "wrote {}\n{}",
                    r.stub.display(),
                    render_patch(&r.entry_point, &r.reference, &r.patch)
                )
            })?;
        }
        Commands::AddReport { root, submodule } => {
            let insertion = add_system_report(ctx, root, submodule.as_deref())?;
            print_one(ctx.json, insertion, |i| {
                render_patch(&i.target, &i.reference, &i.patch)
            })?;
        }
        Commands::ListReports { root } => {
            let sites = list_system_reports(ctx, root)?;
            print_out(ctx.json, &sites, |s| {
                format!(
                    "{}\timports:{}\tcalls:{}",
                    s.file.display(),
                    join_lines(&s.import_lines),
                    join_lines(&s.call_lines)
                )
            })?;
        }
        _ => return Ok(false),
    }

    Ok(true)
}
