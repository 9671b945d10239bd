use crate::agent::catalog;
use crate::agent::AgentContext;

pub fn standards(ctx: AgentContext<'_>, with_providers: bool) {
    let standards = if with_providers {
        catalog::list_standards_and_providers(ctx)
    } else {
        catalog::list_standards(ctx)
    };
    print_lines(&standards);
}

pub fn providers(ctx: AgentContext<'_>) {
    print_lines(&catalog::list_ocf_providers(ctx));
}

pub fn agents(ctx: AgentContext<'_>, standard_provider: Option<&str>) {
    print_lines(&list_agents(ctx, standard_provider));
}

pub fn stonith_agents(ctx: AgentContext<'_>) {
    print_lines(&catalog::list_stonith_agents(ctx));
}

/// Types of one standard/provider, or full names of every installed agent.
fn list_agents(ctx: AgentContext<'_>, standard_provider: Option<&str>) -> Vec<String> {
    match standard_provider {
        Some(standard_provider) => catalog::list_agents(ctx, standard_provider),
        None => catalog::list_standards_and_providers(ctx)
            .into_iter()
            .flat_map(|standard_provider| {
                catalog::list_agents(ctx, &standard_provider)
                    .into_iter()
                    .map(move |agent| format!("{}:{}", standard_provider, agent))
            })
            .collect(),
    }
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}
