use clap::Parser;

/// Explains why the assertions of an instant-runoff voting audit imply the announced winner.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The audit, in JSON format: either the explicit description of the audit or the
    /// output of an assertion generator. See the documentation for the details of the formats.
    #[clap(short, long, value_parser)]
    pub input: String,

    /// (file path, 'stdout' or empty) If specified, the explanation will be written in JSON format to the given
    /// location. By default, it is printed on the standard output.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing an explanation in JSON format. If provided, irvexplain will
    /// check that the produced explanation matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// If passed as an argument, the explanation starts from all the complete elimination orders
    /// instead of the elimination orders of one candidate.
    #[clap(long, takes_value = false)]
    pub expand_fully: bool,

    /// If passed as an argument, the declared winner is not explained.
    #[clap(long, takes_value = false)]
    pub hide_winner: bool,

    /// (number or not specified) If specified, outputs the trees of every candidate expanded
    /// lazily down to the given depth, instead of the step-by-step explanation.
    #[clap(long, value_parser)]
    pub lazy_depth: Option<u32>,

    /// (default 8) The largest number of candidates for which all the elimination orders may be enumerated.
    #[clap(long, value_parser)]
    pub max_exhaustive_candidates: Option<u32>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
