use std::time::Instant;

use stdbus_link::Link;
use tracing::info;

use crate::cmd::ExchangeArgs;
use crate::exit::{link_error, CliResult, SUCCESS};
use crate::output::{print_report, OutputFormat, Report};

pub fn run(args: ExchangeArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.line.link_config()?;
    let request = args.payload.resolve()?;

    let mut link = Link::open_with_config(&args.line.port, config)
        .map_err(|err| link_error("open failed", err))?;

    let started = Instant::now();
    let reply = link
        .exchange(&request)
        .map_err(|err| link_error("exchange failed", err))?;
    let elapsed = started.elapsed();
    info!(port = %args.line.port, request = request.len(), reply = reply.len(), ?elapsed, "exchange complete");

    let report = Report {
        port: Some(args.line.port.as_str()),
        elapsed: Some(elapsed),
        ..Report::new("reply", reply.as_ref())
    };
    print_report(&report, format);
    Ok(SUCCESS)
}
