use std::time::Duration;

use trace_fox::icmp::v4::{EchoRequest, Identifier, SequenceNumber};
use trace_fox::{GenericError, TraceFoxConfig};

#[derive(argh::FromArgs)]
/// traceroute - print the route ICMP echo packets take to a network host
struct Args {
    #[argh(positional)]
    /// host name or IPv4 address
    target: String,

    #[argh(option, short = 'm', default = "32")]
    /// maximum number of hops (TTL) to probe
    max_hops: u8,

    #[argh(option, short = 'w', default = "2.0")]
    /// seconds to wait for a reply on each hop
    wait: f64,

    #[argh(switch)]
    /// keep probing up to max-hops after the target answered
    keep_going: bool,

    #[argh(switch)]
    /// print host names of hops next to their addresses
    resolve_names: bool,

    #[argh(switch, short = 'v')]
    /// log everything
    verbose: bool,
}

fn main() -> Result<(), GenericError> {
    let args: Args = argh::from_env();

    let level = if args.verbose { tracing::Level::TRACE } else { tracing::Level::WARN };
    let subscriber = tracing_subscriber::FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let timeout = Duration::try_from_secs_f64(args.wait)?;
    let config = TraceFoxConfig {
        max_hops: args.max_hops,
        timeout,
        identifier: Identifier::from_process(),
        stop_at_target: !args.keep_going,
    };

    let tracer = trace_fox::create(&config)?;
    let target = trace_fox::resolve_target(&args.target, &trace_fox::SystemLookup)?;
    let package_size = 20 + EchoRequest::new(config.identifier, SequenceNumber(0)).wire_len();
    println!("traceroute to {} ({target}), {} hops max, {package_size} byte packets", args.target, config.max_hops);

    let resolve_names = args.resolve_names;
    let report = tracer.trace_with(target, |hop| match hop.responder() {
        Some(responder) if resolve_names => {
            let name = trace_fox::lookup_addr(responder).unwrap_or_else(|_| responder.to_string());
            println!("{hop}  [{name}]");
        }
        _ => println!("{hop}"),
    });

    if !report.reached_target() {
        println!("{target} not reached within {} hops", report.hops.len());
    }

    Ok(())
}
