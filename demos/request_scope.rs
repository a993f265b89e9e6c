use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ctx_cache::{load_or_compute, Context};

static QUERIES: AtomicUsize = AtomicUsize::new(0);

fn load_profile(ctx: &Context, user: u32) -> Result<Arc<String>, String> {
   load_or_compute(ctx, &format!("load_profile:{user}"), |_| {
      // This closure runs once per request, however many threads ask
      QUERIES.fetch_add(1, Ordering::Relaxed);
      println!("Querying profile {user}...");
      std::thread::sleep(std::time::Duration::from_millis(50));
      Ok(Arc::new(format!("profile of user {user}")))
   })
}

fn main() {
   let request = Context::background().with_call_cache();

   let threads: Vec<_> = (0..5)
      .map(|_| {
         let ctx = request.clone();
         std::thread::spawn(move || {
            println!("Thread access: {}", load_profile(&ctx, 7).unwrap());
         })
      })
      .collect();

   for t in threads {
      t.join().unwrap();
   }
   assert_eq!(QUERIES.load(Ordering::Relaxed), 1);

   // A new request starts with an empty cache
   let next_request = Context::background().with_call_cache();
   println!("Next request: {}", load_profile(&next_request, 7).unwrap());
   assert_eq!(QUERIES.load(Ordering::Relaxed), 2);
}
