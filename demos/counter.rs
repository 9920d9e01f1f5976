use clap::Parser;

use mc_rs::formula::{classify, Formula, Prop};
use mc_rs::reach::compute_reach;
use mc_rs::reference::Ref;
use mc_rs::symbolic::BddSystem;
use mc_rs::verify::verify;

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Number of counter bits.
    #[arg(value_name = "INT", default_value = "3")]
    bits: usize,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    println!("args = {:?}", args);

    // An n-bit binary counter starting at zero:
    //   b0' = !b0
    //   bi' = bi XOR (b0 AND ... AND b_{i-1})
    let n = args.bits;
    println!("Encoding a {}-bit counter", n);

    let mut sys = BddSystem::new();
    let names: Vec<String> = (0..n).map(|i| format!("b{}", i)).collect();
    for name in &names {
        sys.declare_var(name);
    }

    let bits: Vec<Ref> = names.iter().map(|name| sys.var(name).unwrap()).collect();
    sys.set_init(sys.bdd().apply_and_many(bits.iter().map(|&b| -b)));

    let mut constraints = Vec::with_capacity(n);
    let mut carry = sys.bdd().one();
    for (name, &b) in names.iter().zip(&bits) {
        constraints.push(sys.assign_var(name, sys.bdd().apply_xor(b, carry)));
        carry = sys.bdd().apply_and(carry, b);
    }
    let t = sys.build_transition(&constraints);
    sys.set_transition(t);
    sys.validate()?;

    let (reach, trace) = compute_reach(&sys);
    println!(
        "Reachable states: {} in {} layers",
        sys.count_states(&reach),
        trace.len()
    );

    // The counter eventually reaches all-ones, so this invariant fails.
    let all_ones = names
        .iter()
        .fold(Prop::True, |acc, name| acc.and(Prop::atom(name)));
    let formula = Formula::prop(all_ones.clone().not()).globally();
    println!("Checking {}", formula);

    let property = classify(&formula);
    match verify(&sys, &property)? {
        None => println!("Property shape not supported, skipped"),
        Some(verdict) => match verdict.witness() {
            None => println!("Property holds"),
            Some(w) => {
                println!("Property violated, witness of {} steps:", w.inputs().count());
                for state in w.states() {
                    println!("  {:?}", sys.state_assignment(state));
                }
            }
        },
    }

    // "A saturated counter has its low bit set" holds in every state.
    let saturated_low = all_ones.clone().implies(Prop::atom("b0"));
    let formula = Formula::prop(saturated_low).globally();
    println!("Checking {}", formula);
    match verify(&sys, &classify(&formula))? {
        Some(verdict) if verdict.holds() => println!("Property holds"),
        _ => println!("Property violated"),
    }

    // Plain reachability (`F p`) is neither an invariant nor a
    // reactivity property, so the verifier skips it.
    let unsupported = Formula::prop(all_ones).finally();
    println!("Checking {}", unsupported);
    match verify(&sys, &classify(&unsupported))? {
        None => println!("Property shape not supported, skipped"),
        Some(_) => unreachable!(),
    }

    let time_total = time_total.elapsed();
    println!("Done in {:.3} s", time_total.as_secs_f64());

    Ok(())
}
