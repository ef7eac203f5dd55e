use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::info;

use teratap_client::{CancelToken, ClientConfig, TapClient};
use teratap_decode::DecodedMessage;
use teratap_schema::ProtocolData;

use crate::cmd::{resolve_revision, RunArgs};
use crate::exit::{client_error, schema_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: RunArgs, format: OutputFormat) -> CliResult<i32> {
    let data =
        ProtocolData::load(&args.data).map_err(|err| schema_error("protocol bundle", err))?;
    let revision = resolve_revision(&data, args.revision.as_deref())?;
    let opcodes = data
        .opcode_table(&revision)
        .map_err(|err| schema_error("protocol bundle", err))?;
    let catalog = data.catalog();
    info!(
        revision = %revision,
        opcodes = opcodes.len() as u64,
        definitions = catalog.len() as u64,
        "protocol bundle loaded"
    );

    let config = ClientConfig {
        host: args.host.clone(),
        port: args.port,
        blacklist: args.blacklist.iter().cloned().collect(),
        ..ClientConfig::default()
    };

    let mut client = TapClient::new(config, Arc::new(catalog), Arc::new(opcodes));
    let token = client.cancel_token();
    let stats = client.stats();

    let printed = Arc::new(AtomicUsize::new(0));
    match &args.messages {
        Some(names) => {
            for name in names {
                let handler = print_handler(format, printed.clone(), args.count, token.clone());
                client.subscribe(name.clone(), handler);
            }
        }
        None => {
            let handler = print_handler(format, printed.clone(), args.count, token.clone());
            client.subscribe_all(handler);
        }
    }

    install_ctrlc_handler(token)?;

    if args.once {
        client
            .run_once()
            .map_err(|err| client_error("session", err))?;
    } else {
        client.run();
    }

    let snapshot = stats.snapshot();
    info!(
        frames = snapshot.frames,
        decoded = snapshot.decoded,
        printed = printed.load(Ordering::SeqCst) as u64,
        unknown_opcodes = snapshot.unknown_opcode,
        missing_schemas = snapshot.missing_schema,
        blacklisted = snapshot.blacklisted,
        corrupt_frames = snapshot.corrupt_frames,
        bytes_discarded = snapshot.bytes_discarded,
        buffer_resets = snapshot.buffer_resets,
        reconnects = snapshot.reconnects,
        "tap finished"
    );

    Ok(SUCCESS)
}

fn print_handler(
    format: OutputFormat,
    printed: Arc<AtomicUsize>,
    count: Option<usize>,
    token: CancelToken,
) -> impl Fn(&DecodedMessage) + Send + 'static {
    move |message| {
        print_message(message, format);
        let total = printed.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(count) = count {
            if total >= count {
                token.cancel();
            }
        }
    }
}

fn install_ctrlc_handler(token: CancelToken) -> CliResult<()> {
    ctrlc::set_handler(move || {
        token.cancel();
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
