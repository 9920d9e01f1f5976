use clap::Parser;

use mc_rs::formula::Prop;
use mc_rs::symbolic::{BddSet, BddSystem};
use mc_rs::verify::{verify_reactivity, Verdict};
use mc_rs::witness::Witness;

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {}

#[derive(Debug, Clone, Copy)]
enum Policy {
    /// Client 0 wins whenever it requests.
    FixedPriority,
    /// Strict alternation, requests notwithstanding.
    RoundRobin,
}

/// A two-client arbiter with one grant bit `g` (client 0 when `g = 0`,
/// client 1 when `g = 1`) and request inputs `r0`, `r1`.
fn arbiter(policy: Policy) -> BddSystem {
    let mut sys = BddSystem::new();
    sys.declare_var("g");
    let r0 = sys.declare_input("r0");
    let r1 = sys.declare_input("r1");

    let g = sys.var("g").unwrap();
    let r0 = sys.bdd().mk_var(r0);
    let r1 = sys.bdd().mk_var(r1);
    sys.set_init(-g);

    let next = match policy {
        Policy::FixedPriority => sys.bdd().apply_and(r1, -r0),
        Policy::RoundRobin => -g,
    };
    let t = sys.assign_var("g", next);
    sys.set_transition(t);

    sys.add_label("grant0", -g);
    sys.add_label("grant1", g);
    sys
}

fn print_lasso(sys: &BddSystem, w: &Witness<BddSet>) {
    let states: Vec<_> = w.states().collect();
    let inputs: Vec<_> = w.inputs().collect();
    for (i, state) in states.iter().enumerate() {
        println!("  state  {:?}", sys.state_assignment(state));
        if i < inputs.len() {
            println!("  inputs {:?}", sys.input_assignment(inputs[i]));
        }
    }
    println!("  (the final state closes the loop)");
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let _args = Cli::parse();

    // "If client 0 is granted infinitely often, so is client 1."
    let f = Prop::atom("grant0");
    let g = Prop::atom("grant1");

    for policy in [Policy::FixedPriority, Policy::RoundRobin] {
        println!("Policy {:?}: checking GF {} -> GF {}", policy, f, g);

        let sys = arbiter(policy);
        sys.validate()?;

        // Fixed priority starves client 1 when client 0 keeps requesting.
        match verify_reactivity(&sys, &f, &g)? {
            Verdict::Satisfied => println!("Property holds"),
            Verdict::Violated(w) => {
                println!("Property violated, lasso witness:");
                print_lasso(&sys, &w);
            }
        }
        println!();
    }

    Ok(())
}
