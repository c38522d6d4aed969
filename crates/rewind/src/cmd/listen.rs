use rewind_frame::{AreaDesc, DecoderConfig, Frame, FrameError, SceneConsumer};
use rewind_listener::{ListenerConfig, ListenerError, ListenerHandle, NetListener};
use rewind_transport::TransportError;
use tracing::{info, warn};

use crate::cmd::{parse_duration, ListenArgs};
use crate::exit::{listener_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_area, print_frame, print_summary, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let read_timeout = args
        .read_timeout
        .as_deref()
        .map(parse_duration)
        .transpose()?;
    let config = ListenerConfig {
        nodelay: !args.nagle,
        decoder: DecoderConfig {
            max_body_size: args.max_body_size,
            read_timeout,
        },
    };

    let listener = NetListener::bind(args.addr.as_str())
        .map_err(|err| listener_error("bind failed", err))?
        .with_config(config);
    info!(addr = %listener.local_addr(), "waiting for producer");

    install_ctrlc_handler(listener.handle())?;

    let mut printer = FramePrinter {
        format,
        limit: args.count,
        skip_areas: args.skip_areas,
        printed: 0,
        handle: listener.handle(),
    };

    match listener.run(&mut printer) {
        Ok(summary) => {
            let stopped_by = if printer.limit_reached() {
                "count"
            } else {
                "signal"
            };
            print_summary(&summary, stopped_by, format);
            Ok(SUCCESS)
        }
        Err(ListenerError::Frame(FrameError::Transport(TransportError::ConnectionClosed)))
            if printer.printed > 0 =>
        {
            info!(frames = printer.printed, "producer closed the connection");
            Ok(SUCCESS)
        }
        Err(err) => Err(listener_error("receive failed", err)),
    }
}

struct FramePrinter {
    format: OutputFormat,
    limit: Option<u64>,
    skip_areas: bool,
    printed: u64,
    handle: ListenerHandle,
}

impl FramePrinter {
    fn limit_reached(&self) -> bool {
        self.limit.is_some_and(|limit| self.printed >= limit)
    }
}

impl SceneConsumer for FramePrinter {
    fn submit_frame(&mut self, frame: Frame) {
        self.printed = self.printed.saturating_add(1);
        print_frame(&frame, self.printed, self.format);
        if self.limit_reached() {
            self.handle.stop();
        }
    }

    fn submit_area(&mut self, area: AreaDesc) {
        if !self.skip_areas {
            print_area(&area, self.format);
        }
    }
}

/// First ctrl-c requests a cooperative stop; a second one exits at once,
/// since a read blocked on a silent producer never reaches a checkpoint.
fn install_ctrlc_handler(handle: ListenerHandle) -> CliResult<()> {
    ctrlc::set_handler(move || {
        if handle.is_stop_requested() {
            warn!("second interrupt; exiting without waiting for the producer");
            std::process::exit(130);
        }
        handle.stop();
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
