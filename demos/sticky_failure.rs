use ctx_cache::{load_or_compute, Context};

fn read_quota(ctx: &Context, fail: bool) -> Result<u32, String> {
   load_or_compute(ctx, "read_quota", |_| {
      println!("Reading quota (fail={})...", fail);
      if fail {
         Err("quota service unavailable".to_string())
      } else {
         Ok(100)
      }
   })
}

fn main() {
   let request = Context::background().with_call_cache();

   // First attempt fails
   match read_quota(&request, true) {
      Ok(_) => panic!("Should have failed"),
      Err(e) => println!("Caught error: {}", e),
   }

   // The failure is cached for the rest of the request
   match read_quota(&request, false) {
      Ok(_) => panic!("Should have returned the cached failure"),
      Err(e) => println!("Cached error: {}", e),
   }

   // A fresh request gets a fresh attempt
   let retry = Context::background().with_call_cache();
   match read_quota(&retry, false) {
      Ok(quota) => println!("Got quota: {}", quota),
      Err(_) => panic!("Should have succeeded"),
   }
}
