#[rocket::launch]
fn rocket() -> _ {
    duel_arena::rocket_initialize()
}
