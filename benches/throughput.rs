use redis::Commands;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

fn start_server(port: u16) -> tokio::task::JoinHandle<()> {
    let config = Arc::new(rill::config::Config {
        port,
        ..Default::default()
    });
    let store = Arc::new(RwLock::new(rill::store::Store::new()));

    tokio::spawn(async move {
        let _ = rill::server::run(store, config).await;
    })
}

fn get_client(port: u16) -> redis::Connection {
    let client = redis::Client::open(format!("redis://127.0.0.1:{port}/")).unwrap();
    for i in 0..50 {
        match client.get_connection() {
            Ok(conn) => return conn,
            Err(_) if i < 49 => {
                std::thread::sleep(std::time::Duration::from_millis(100));
            }
            Err(e) => panic!("Failed to connect: {e}"),
        }
    }
    unreachable!()
}

fn bench_set_get(conn: &mut redis::Connection, iterations: usize) -> (f64, f64) {
    let start = Instant::now();
    for i in 0..iterations {
        let _: () = conn
            .set(format!("bench_key_{i}"), format!("value_{i}"))
            .unwrap();
    }
    let set_ops = iterations as f64 / start.elapsed().as_secs_f64();

    let start = Instant::now();
    for i in 0..iterations {
        let _: String = conn.get(format!("bench_key_{i}")).unwrap();
    }
    let get_ops = iterations as f64 / start.elapsed().as_secs_f64();

    (set_ops, get_ops)
}

fn bench_rpush_lpop(conn: &mut redis::Connection, iterations: usize) -> (f64, f64) {
    let start = Instant::now();
    for i in 0..iterations {
        let _: i64 = conn.rpush("bench_list", format!("item_{i}")).unwrap();
    }
    let push_ops = iterations as f64 / start.elapsed().as_secs_f64();

    let start = Instant::now();
    for _ in 0..iterations {
        let _: Option<String> = redis::cmd("LPOP").arg("bench_list").query(conn).unwrap();
    }
    let pop_ops = iterations as f64 / start.elapsed().as_secs_f64();

    (push_ops, pop_ops)
}

fn bench_xadd(conn: &mut redis::Connection, iterations: usize) -> f64 {
    let start = Instant::now();
    for i in 0..iterations {
        let _: String = redis::cmd("XADD")
            .arg("bench_stream")
            .arg("*")
            .arg("n")
            .arg(i)
            .query(conn)
            .unwrap();
    }
    iterations as f64 / start.elapsed().as_secs_f64()
}

fn bench_ping(conn: &mut redis::Connection, iterations: usize) -> f64 {
    let start = Instant::now();
    for _ in 0..iterations {
        let _: String = redis::cmd("PING").query(conn).unwrap();
    }
    iterations as f64 / start.elapsed().as_secs_f64()
}

#[tokio::main]
async fn main() {
    let port = 17100;
    let _server = start_server(port);
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;

    tokio::task::spawn_blocking(move || {
        let mut conn = get_client(port);
        let iterations = 10_000;

        println!("=== Rill Benchmark ({iterations} operations) ===\n");

        let ping_ops = bench_ping(&mut conn, iterations);
        println!("PING:   {ping_ops:>10.0} ops/sec");

        let (set_ops, get_ops) = bench_set_get(&mut conn, iterations);
        println!("SET:    {set_ops:>10.0} ops/sec");
        println!("GET:    {get_ops:>10.0} ops/sec");

        let (push_ops, pop_ops) = bench_rpush_lpop(&mut conn, iterations);
        println!("RPUSH:  {push_ops:>10.0} ops/sec");
        println!("LPOP:   {pop_ops:>10.0} ops/sec");

        let xadd_ops = bench_xadd(&mut conn, iterations);
        println!("XADD:   {xadd_ops:>10.0} ops/sec");

        println!("\n=== Done ===");
    })
    .await
    .unwrap();
}
