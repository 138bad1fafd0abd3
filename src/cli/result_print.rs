// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use clap::Parser;
use log::{debug, info};

use super::common::InfoPrinter;
use crate::{FscalError, SessionResult};

#[derive(Parser, Debug)]
pub(super) struct ResultPrintArgs {
    /// The session result file to print.
    #[clap(name = "RESULT_FILE", parse(from_os_str))]
    file: PathBuf,

    /// Write the text here instead of stdout.
    #[clap(short, long)]
    output: Option<PathBuf>,
}

impl ResultPrintArgs {
    pub(super) fn run(self) -> Result<(), FscalError> {
        let result = SessionResult::read(&self.file)?;

        let mut printer = InfoPrinter::new(format!("Result {}", self.file.display()).into());
        printer.push_block(vec![
            format!("Species: {}", result.species).into(),
            format!("Rest frequency: {} Hz", result.rest_frequency).into(),
            format!("{} channels", result.num_channels()).into(),
        ]);
        if let (Some(first), Some(last)) = (result.velocity.first(), result.velocity.last()) {
            printer.push_line(format!("Velocities from {first:.3} to {last:.3} km/s").into());
        }
        printer.display();

        match self.output {
            Some(output) => {
                debug!("Writing text to {}", output.display());
                let mut f = BufWriter::new(File::create(&output)?);
                result.write_text(&mut f)?;
                f.flush()?;
                info!("Wrote {}", output.display());
            }
            None => {
                let stdout = std::io::stdout();
                let mut lock = stdout.lock();
                result.write_text(&mut lock)?;
            }
        }
        Ok(())
    }
}
