/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */
#![allow(unused)]

use message_hub::prelude::*;

#[hub_message(response = Pong)]
pub struct Ping;

#[hub_message]
pub struct Pong {
    pub from: String,
}

/// Handled without ever being answered.
#[hub_message(response = Pong)]
pub struct Unanswered;

/// Its handler always returns an error.
#[hub_message(response = Pong)]
pub struct Faulty;

/// Its handler panics.
#[hub_message]
pub struct Explode;

#[hub_message]
pub struct Note(pub u32);

#[hub_message]
pub struct Animal {
    pub name: String,
}

#[hub_message]
pub struct Dog {
    pub animal: Animal,
    pub breed: String,
}

pub fn animal_of(dog: &Dog) -> &Animal {
    &dog.animal
}
