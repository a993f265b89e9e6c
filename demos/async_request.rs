use std::sync::atomic::{AtomicUsize, Ordering};

use ctx_cache::{load_or_compute_async, Context};
use tokio::time::{sleep, Duration};

static FETCHES: AtomicUsize = AtomicUsize::new(0);

async fn exchange_rate(ctx: &Context, pair: &str) -> Result<f64, String> {
   load_or_compute_async(ctx, &format!("exchange_rate:{pair}"), |_| async {
      // This async block runs only once per request
      FETCHES.fetch_add(1, Ordering::Relaxed);
      println!("Fetching rate...");
      sleep(Duration::from_millis(50)).await;
      Ok(1.08)
   })
   .await
}

#[tokio::main]
async fn main() {
   let request = Context::background().with_call_cache();

   let tasks: Vec<_> = (0..5)
      .map(|_| {
         let ctx = request.clone();
         tokio::spawn(async move {
            println!("Task access: {}", exchange_rate(&ctx, "EUR/USD").await.unwrap());
         })
      })
      .collect();

   for t in tasks {
      t.await.unwrap();
   }

   assert_eq!(FETCHES.load(Ordering::Relaxed), 1);
   println!("Cached rate: {}", exchange_rate(&request, "EUR/USD").await.unwrap());
}
