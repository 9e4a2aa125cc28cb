//! `nexus-route rewrite` command.

use clap::Args;
use nexus_route_core::{ProxyPrefix, Rewriter};

use crate::context::Context;
use crate::output::new_table;

#[derive(Args)]
pub struct RewriteArgs {
    /// Image references (e.g., "alpine:latest", "ghcr.io/org/image:tag")
    #[arg(required = true)]
    pub references: Vec<String>,

    /// Docker Hub proxy prefix (overrides the configuration)
    #[arg(long)]
    pub hub_prefix: Option<String>,

    /// GHCR proxy prefix (overrides the configuration)
    #[arg(long)]
    pub ghcr_prefix: Option<String>,

    /// Show which rule applied to each reference
    #[arg(long)]
    pub explain: bool,
}

pub async fn execute(args: RewriteArgs, ctx: Context) -> Result<(), Box<dyn std::error::Error>> {
    let hub = match &args.hub_prefix {
        Some(p) => ProxyPrefix::parse(p)?,
        None => ctx.config.hub_prefix()?,
    };
    let ghcr = match &args.ghcr_prefix {
        Some(p) => ProxyPrefix::parse(p)?,
        None => ctx.config.ghcr_prefix()?,
    };
    let rewriter = Rewriter::new(&hub, &ghcr);

    if args.explain {
        let mut table = new_table(&["REFERENCE", "RULE", "RESULT"]);
        for reference in &args.references {
            let r = rewriter.rewrite(reference);
            table.add_row([r.original, r.rule.to_string(), r.rewritten]);
        }
        println!("{table}");
    } else {
        for reference in &args.references {
            println!("{}", rewriter.rewrite(reference).rewritten);
        }
    }
    Ok(())
}
