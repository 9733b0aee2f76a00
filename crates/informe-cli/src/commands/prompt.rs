use informe_core::display::prepare;
use informe_core::error::InformeError;
use informe_core::prompt::load_templates;

use crate::args::{PrepareArgs, PromptArgs, SourceArgs};
use crate::commands::{load, warn_quartiles};

pub fn run(source: &SourceArgs, prepare_args: &PrepareArgs, prompt_args: &PromptArgs) -> Result<(), InformeError> {
    let templates = load_templates()?;
    let prepared = prepare(load(source)?, &prepare_args.to_options())?;
    warn_quartiles(prepared.quartile_diagnostic.as_deref());

    let prompt = templates.build(&prepared.display, prompt_args.level, prompt_args.context.as_deref())?;
    println!("{prompt}");
    Ok(())
}
