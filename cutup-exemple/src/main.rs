use cutup_core::markov::MarkovOptions;
use cutup_core::markov::pos::generate_pos_markov;
use cutup_core::markov::word::generate_markov;
use cutup_core::refine::{AbortHandle, DEFAULT_SYSTEM_PROMPT, MODELS, RefineModel, RefineOutcome, Refiner};
use cutup_core::session::{Session, Technique};
use cutup_core::text::engine::{CutUpOptions, FoldInOptions, perform_cut_up, perform_fold_in, perform_permutation};
use cutup_core::text::syllable::{break_by_syllables, count_syllables};

const FIRST: &str = "The river remembers every name we forgot. \
    Lanterns drift over the water like slow questions. \
    Somewhere a radio plays the news of another century.";

const SECOND: &str = "Machines dream in the basement of the library. \
    The clerk counts syllables on her fingers. \
    Every door opens onto the same corridor.";

/// A stand-in for a real language model: reverses the order of the lines.
struct ReverseModel;

impl RefineModel for ReverseModel {
    fn load(&mut self, model_id: &str) -> Result<(), String> {
        println!("(loading {model_id})");
        Ok(())
    }

    fn generate(&mut self, _system_prompt: &str, text: &str, _abort: &AbortHandle) -> Result<String, String> {
        Ok(text.lines().rev().collect::<Vec<_>>().join("\n"))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=debug shows chain sizes and sampling details
    env_logger::init();

    // Classic cut-up: both texts are cut into fragments of 'fragment_size' words,
    // shuffled 'chaos_level' times and re-flowed into lines
    let cut = perform_cut_up(&[FIRST, SECOND], CutUpOptions { fragment_size: 3, chaos_level: 4 });
    println!("== Cut-up ({} fragments)\n{}\n", cut.fragments.len(), cut.text);

    // Fold-in: the left part of each line comes from the first text,
    // the right part from the second one
    let fold = perform_fold_in(FIRST, SECOND, FoldInOptions { fold_position: 50, line_width: 40 });
    println!("== Fold-in\n{}\n", fold.text);

    // Permutations: every ordering up to 7 words, 200 samples above
    let permutation = perform_permutation("the clerk counts syllables");
    println!(
        "== Permutation ({} of {} orderings)\n{}\n",
        permutation.lines.len(),
        permutation.total_permutations,
        permutation.lines[..4].join("\n")
    );

    // Syllables drive line breaks when writing to a meter
    println!("'corridor' has {} syllables", count_syllables("corridor"));
    println!("== Five syllables per line\n{}\n", break_by_syllables(&cut.text, 5));

    // Markov generators: word chains keep local phrasing, POS chains keep
    // the grammatical skeleton and pick words from the source
    let options = MarkovOptions { order: 1, count: 3, ..MarkovOptions::default() };
    println!("== Word Markov\n{}\n", generate_markov(&format!("{FIRST} {SECOND}"), options));
    println!("== POS Markov\n{}\n", generate_pos_markov(&format!("{FIRST} {SECOND}"), options));

    // A session keeps inputs, settings and a history of cuts
    let mut session = Session::new();
    session.set_input_text(FIRST);
    session.set_second_input_text(SECOND);
    session.set_chaos_level(42); // Clamped to 10
    session.cut();
    session.set_technique(Technique::LineShuffle);
    session.set_input_text(session.output_text().to_owned());
    session.cut();
    println!("== Session: {} history entries, chaos {}", session.history().len(), session.settings().chaos_level);

    // Erasure: cut builds a grid of words, each toggle keeps a word
    session.set_technique(Technique::Erasure);
    session.set_input_text("nothing is true\neverything is permitted");
    session.cut();
    session.toggle_erasure_word(0, 0);
    session.toggle_erasure_word(1, 0);
    println!("== Erasure\n{}\n", session.erasure_text());

    // History can be exported and merged into another session
    let export = session.export_history()?;
    let mut other = Session::new();
    match other.import_history(&export) {
        true => println!("Imported {} entries into another session", other.history().len()),
        false => println!("Should not happen"),
    }
    match other.import_history("{\"version\": 2, \"entries\": []}") {
        true => println!("Should not happen"),
        false => println!("Version 2 exports are rejected"),
    }

    // Refinement goes through a model created lazily by a factory
    let mut refiner = Refiner::new(|| ReverseModel);
    match refiner.refine(MODELS[0].id, DEFAULT_SYSTEM_PROMPT, &cut.text)? {
        RefineOutcome::Complete(text) => println!("== Refined by {}\n{}", MODELS[0].label, text),
        RefineOutcome::Aborted => println!("Refinement aborted"),
    }
    refiner.dispose();

    Ok(())
}
