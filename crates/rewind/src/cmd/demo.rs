use std::f32::consts::TAU;

use rewind_frame::{palette, SceneWriter};
use rewind_transport::TcpTransport;
use tracing::info;

use crate::cmd::{parse_duration, DemoArgs};
use crate::exit::{frame_error, transport_error, CliResult, SUCCESS};
use crate::output::OutputFormat;

const FIELD: f32 = 100.0;
const UNITS: u32 = 6;

pub fn run(args: DemoArgs, _format: OutputFormat) -> CliResult<i32> {
    let interval = parse_duration(&args.interval)?;
    let write_timeout = args
        .write_timeout
        .as_deref()
        .map(parse_duration)
        .transpose()?;
    let stream = TcpTransport::connect(args.addr.as_str())
        .map_err(|err| transport_error("connect failed", err))?;
    let mut writer = SceneWriter::with_timeout_net(stream, write_timeout)
        .map_err(|err| frame_error("connect failed", err))?;

    for tick in 0..args.frames {
        if tick == 0 {
            for x in 0..4 {
                for y in 0..4 {
                    writer.area(x, y, ((x + y) % 4) as i16);
                }
            }
        }
        draw_tick(&mut writer, tick)
            .and_then(|w| w.end_frame())
            .map_err(|err| frame_error("send failed", err))?;
        info!(tick, "sent demo frame");

        if tick + 1 < args.frames {
            std::thread::sleep(interval);
        }
    }

    Ok(SUCCESS)
}

fn draw_tick<W: std::io::Write>(
    writer: &mut SceneWriter<W>,
    tick: u32,
) -> rewind_frame::Result<&mut SceneWriter<W>> {
    writer.rect(0.0, FIELD, FIELD, 0.0, palette::GRAY);
    writer.line(0.0, 0.0, FIELD, FIELD, palette::GREEN);
    writer.line(0.0, FIELD, FIELD, 0.0, palette::GREEN);

    let phase = tick as f32 * 0.1;
    for i in 0..UNITS {
        let angle = phase + TAU * i as f32 / UNITS as f32;
        let x = FIELD / 2.0 + angle.cos() * FIELD / 3.0;
        let y = FIELD / 2.0 + angle.sin() * FIELD / 3.0;
        let enemy = match i % 3 {
            0 => 1,
            1 => -1,
            _ => 0,
        };
        let hp = 100 - (tick * 3 + i * 7) % 100;
        writer.living_unit(x, y, 2.0, hp, 100, enemy, angle, (i % 5) as i16);
    }

    writer.circle(FIELD / 2.0, FIELD / 2.0, 1.0 + (tick % 10) as f32, palette::RED);
    writer.message(&format!("demo tick {tick}"))
}
